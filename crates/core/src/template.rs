// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline template entities: the declarative recipe a pipeline is
//! materialized from. Immutable after seeding.

use crate::status::DependencyType;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a pipeline template.
    TemplateId
}

crate::define_id! {
    /// Unique identifier for a template stage.
    TemplateStageId
}

crate::define_id! {
    /// Unique identifier for a template job.
    TemplateJobId
}

/// A declarative pipeline recipe: ordered stages of jobs plus dependency
/// edges between template jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub stages: Vec<TemplateStage>,
    pub dependencies: Vec<TemplateDependency>,
}

impl Template {
    /// Find a template job across all stages.
    pub fn job(&self, id: &TemplateJobId) -> Option<&TemplateJob> {
        self.stages.iter().flat_map(|s| s.jobs.iter()).find(|j| &j.id == id)
    }

    /// Stage a template job belongs to.
    pub fn stage_of(&self, id: &TemplateJobId) -> Option<&TemplateStage> {
        self.stages.iter().find(|s| s.jobs.iter().any(|j| &j.id == id))
    }
}

/// An ordered grouping of template jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStage {
    pub id: TemplateStageId,
    pub template_id: TemplateId,
    pub name: String,
    pub stage_order: i64,
    pub jobs: Vec<TemplateJob>,
}

/// Declarative job definition inside a template stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateJob {
    pub id: TemplateJobId,
    pub template_stage_id: TemplateStageId,
    pub agent_type: String,
    /// May contain `{{original_prompt}}`.
    pub prompt_template: String,
    /// May contain `{{job_id}}`, `{{prompt}}`, `{{agent_type}}`.
    pub command_template: Option<String>,
    pub max_iterations: u32,
    pub timeout_seconds: u64,
    /// Retry ceiling; instantiation applies the default when absent.
    pub max_retries: Option<u32>,
    pub artifact_strategy: Option<serde_json::Value>,
    pub retry_strategy: Option<serde_json::Value>,
    /// Fan-out declaration referencing a source template job.
    pub job_multiplier: Option<serde_json::Value>,
}

/// Dependency edge between two template jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDependency {
    pub template_job_id: TemplateJobId,
    pub depends_on_template_job_id: TemplateJobId,
    pub dependency_type: DependencyType,
}
