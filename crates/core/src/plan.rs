// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialization plans: row sets computed up front and inserted in a
//! single transaction. Template instantiation and multiplier fan-out both
//! produce these; the store only ever applies them atomically.

use crate::artifact::ArtifactId;
use crate::job::{JobDependency, JobId};
use crate::pipeline::PipelineId;
use crate::stage::StageId;
use crate::template::{TemplateId, TemplateJobId};

/// A pipeline row to be created, born `pending`.
#[derive(Debug, Clone)]
pub struct NewPipeline {
    pub id: PipelineId,
    pub template_id: Option<TemplateId>,
    pub original_prompt: String,
    pub workspace_path: String,
}

/// A stage row to be created, born `pending`.
#[derive(Debug, Clone)]
pub struct NewStage {
    pub id: StageId,
    pub pipeline_id: PipelineId,
    pub name: String,
    pub stage_order: i64,
}

/// A job row to be created, born `pending`.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: JobId,
    pub pipeline_id: PipelineId,
    pub stage_id: StageId,
    pub agent_type: String,
    pub prompt: String,
    pub command: Option<String>,
    pub max_iterations: u32,
    pub timeout_seconds: u64,
    pub allowed_paths: Vec<String>,
    pub max_retries: u32,
    pub artifact_strategy: Option<serde_json::Value>,
    pub retry_strategy: Option<serde_json::Value>,
    pub template_job_id: Option<TemplateJobId>,
    pub parent_job_id: Option<JobId>,
}

/// Full materialization of a template into one new pipeline.
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    pub pipeline: NewPipeline,
    pub stages: Vec<NewStage>,
    pub jobs: Vec<NewJob>,
    pub dependencies: Vec<JobDependency>,
}

/// An artifact row to be persisted for a completed job.
#[derive(Debug, Clone)]
pub struct NewArtifact {
    pub id: ArtifactId,
    pub job_id: JobId,
    pub kind: String,
    pub name: String,
    pub description: String,
    pub file_path: Option<String>,
    pub content: Option<String>,
    pub content_hash: Option<String>,
    pub size_bytes: u64,
    pub metadata: Option<serde_json::Value>,
}
