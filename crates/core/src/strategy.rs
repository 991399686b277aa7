// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy configurations carried as JSON on template jobs and jobs:
//! retry behavior, artifact collection, and the job multiplier.
//!
//! All of these resolve leniently. Config JSON is authored by template
//! seeds and must never wedge the orchestrator: unknown artifact strategy
//! types fall back to `stdout_final`, malformed retry configs behave as
//! "no retry context", and multiplier parse failures degrade per strategy.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default context instruction prepended to a retry prompt.
pub const DEFAULT_CONTEXT_INSTRUCTION: &str =
    "IMPORTANT: This is a retry. Previous attempt output is below. Continue from where you left off.\n\n";

/// How a job behaves across retry attempts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryStrategy {
    /// Carry the previous attempt's output into the next prompt.
    #[serde(default)]
    pub include_context: bool,
    /// Instruction prefix for the augmented prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_instruction: Option<String>,
}

impl RetryStrategy {
    /// Lenient parse from a job's raw JSON column. Absent or malformed
    /// configs behave as the default (no context carry-over).
    pub fn resolve(value: Option<&Value>) -> Self {
        value
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Build the augmented prompt for a retry attempt, or `None` when this
    /// strategy does not carry context or there is no previous output.
    pub fn augment_prompt(&self, previous_output: &str, original_prompt: &str) -> Option<String> {
        if !self.include_context || previous_output.is_empty() {
            return None;
        }
        let instruction = self
            .context_instruction
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT_INSTRUCTION);
        Some(format!(
            "{instruction}=== PREVIOUS ATTEMPT OUTPUT ===\n{previous_output}\n\n=== ORIGINAL TASK ===\n{original_prompt}"
        ))
    }
}

/// Artifact collection strategy, resolved from `{"type": "<name>", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactStrategyConfig {
    /// Capture the final accumulated output as one inline artifact.
    StdoutFinal,
    /// Capture workspace files modified or added since job start.
    WorkspaceDelta,
    /// Union of nested strategies.
    Composite {
        #[serde(default)]
        strategies: Vec<ArtifactStrategyConfig>,
    },
}

impl ArtifactStrategyConfig {
    /// Resolve a job's raw config. Absent configs and unknown types fall
    /// back to `stdout_final`; composite members resolve independently.
    pub fn resolve(value: Option<&Value>) -> Self {
        match value {
            Some(v) => Self::resolve_value(v),
            None => ArtifactStrategyConfig::StdoutFinal,
        }
    }

    fn resolve_value(value: &Value) -> Self {
        match value.get("type").and_then(Value::as_str) {
            Some("workspace_delta") => ArtifactStrategyConfig::WorkspaceDelta,
            Some("composite") => {
                let strategies = value
                    .get("strategies")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().map(Self::resolve_value).collect())
                    .unwrap_or_default();
                ArtifactStrategyConfig::Composite { strategies }
            }
            _ => ArtifactStrategyConfig::StdoutFinal,
        }
    }

    /// Whether any branch of this config needs a workspace snapshot taken
    /// before the job starts.
    pub fn uses_workspace_delta(&self) -> bool {
        match self {
            ArtifactStrategyConfig::StdoutFinal => false,
            ArtifactStrategyConfig::WorkspaceDelta => true,
            ArtifactStrategyConfig::Composite { strategies } => {
                strategies.iter().any(Self::uses_workspace_delta)
            }
        }
    }
}

/// Where the multiplier reads its items from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiplierSource {
    /// A named inline artifact of the parent job.
    #[default]
    Artifact,
    /// The parent's last recorded action's `finish` args.
    Action,
}

/// How multiplier item text is split into individual items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    #[default]
    JsonArray,
    LineDelimited,
    CommaSeparated,
}

fn default_artifact_name() -> String {
    crate::artifact::FINAL_OUTPUT_NAME.to_string()
}

fn default_item_template() -> String {
    "{{item}}".to_string()
}

/// Fan-out declaration on a template job: when the referenced source job
/// completes, its output is parsed into items and one child job is spawned
/// per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierConfig {
    pub source_template_job_id: String,
    #[serde(default)]
    pub source_type: MultiplierSource,
    #[serde(default = "default_artifact_name")]
    pub artifact_name: String,
    #[serde(default)]
    pub parse_strategy: ParseStrategy,
    /// May contain `{{item}}`, `{{original_prompt}}`, `{{index}}`.
    #[serde(default = "default_item_template")]
    pub prompt_template: String,
}

impl MultiplierConfig {
    /// Parse a template job's `job_multiplier` column. Returns `None` for
    /// absent or malformed configs.
    pub fn resolve(value: Option<&Value>) -> Option<Self> {
        value.and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
