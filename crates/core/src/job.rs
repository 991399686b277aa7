// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job entity and dependency edges.

use crate::pipeline::PipelineId;
use crate::stage::StageId;
use crate::status::{DependencyType, JobStatus};
use crate::template::TemplateJobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a job instance.
    JobId
}

/// Command line used when a job declares no custom command. The agent
/// harness reads its task from the shared database by job id.
pub fn harness_command(job_id: &JobId) -> String {
    format!("clowder-agent {}", job_id)
}

/// A single unit of agent work. One subprocess invocation per attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub pipeline_id: PipelineId,
    pub stage_id: StageId,
    pub agent_type: String,
    /// Prompt handed to the agent. Rewritten in place on context-carrying
    /// retries; read `original_prompt` for the true input.
    pub prompt: String,
    /// Prompt as materialized at instantiation time.
    pub original_prompt: String,
    /// Custom command line; the default harness command is used when absent.
    pub command: Option<String>,
    pub max_iterations: u32,
    pub timeout_seconds: u64,
    pub allowed_paths: Vec<String>,
    /// Artifact collection config (raw JSON; resolved leniently at use).
    pub artifact_strategy: Option<serde_json::Value>,
    /// Retry behavior config (raw JSON; resolved leniently at use).
    pub retry_strategy: Option<serde_json::Value>,
    /// Template job this was materialized from, if any.
    pub template_job_id: Option<TemplateJobId>,
    /// Set on multiplier-spawned children: the completed job whose output
    /// produced this one.
    pub parent_job_id: Option<JobId>,
    pub status: JobStatus,
    /// Iteration counter owned by the agent subprocess.
    pub iteration: u32,
    pub retry_count: u32,
    pub max_retries: u32,
    pub termination_reason: Option<String>,
    /// Accumulated stdout+stderr of the most recent attempt.
    pub job_output: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Command line for the next attempt.
    pub fn effective_command(&self) -> String {
        match &self.command {
            Some(command) => command.clone(),
            None => harness_command(&self.id),
        }
    }

    /// Whether another attempt is permitted after a failure.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// 1-based attempt number of the current run.
    pub fn attempt(&self) -> u32 {
        self.retry_count + 1
    }
}

/// A directed dependency edge between two jobs in the same pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDependency {
    pub job_id: JobId,
    pub depends_on_job_id: JobId,
    pub dependency_type: DependencyType,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
