// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON shapes for the HTTP surface.

use clowder_core::{Job, Pipeline};
use serde::{Deserialize, Serialize};

fn default_workspace() -> String {
    "/workspace".to_string()
}

fn default_limit() -> u32 {
    10
}

/// Body of `POST /pipelines/{id}/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPipelineRequest {
    pub prompt: String,
    #[serde(default = "default_workspace")]
    pub workspace_path: String,
    #[serde(default)]
    pub excluded_stage_ids: Vec<String>,
    #[serde(default)]
    pub excluded_job_ids: Vec<String>,
}

/// Response of `POST /pipelines/{id}/start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedPipeline {
    pub pipeline_id: String,
    pub template_id: String,
    pub name: String,
    pub prompt: String,
    pub status: String,
}

/// Response of `POST /pipelines/{id}/stop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoppedPipeline {
    pub pipeline_id: String,
    pub name: String,
    pub status: String,
}

/// Query of `GET /pipelines/recent`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// One template in `GET /pipelines/templates/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDetails {
    pub id: String,
    pub name: String,
    pub description: String,
    pub stages: Vec<TemplateStageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStageView {
    pub id: String,
    pub name: String,
    pub jobs: Vec<TemplateJobView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateJobView {
    pub id: String,
    pub agent_type: String,
    pub prompt_template: String,
    pub dependencies: Vec<TemplateDependencyView>,
}

/// Dependency rendered with the target's agent type, the way the terminal
/// client displays edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDependencyView {
    pub depends_on: String,
    #[serde(rename = "type")]
    pub dependency_type: String,
}

/// One pipeline in the `/running` and `/recent` listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineView {
    pub id: String,
    /// Prompt truncated to 50 characters.
    pub name: String,
    pub description: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub stages: Vec<StageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageView {
    pub name: String,
    pub jobs: Vec<JobView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub name: String,
    pub status: String,
    pub log: String,
    pub retries: u32,
}

/// Response of `GET /pipelines/{id}`: the raw pipeline row plus its jobs
/// annotated with stage placement.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineDetail {
    pub pipeline: Pipeline,
    pub jobs: Vec<JobDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub stage_name: String,
    pub stage_order: i64,
}
