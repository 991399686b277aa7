// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row-to-entity mapping helpers shared by the query modules.

use clowder_core::status::ParseStatusError;
use clowder_core::{
    Artifact, DependencyType, Job, JobDependency, JobId, JobStatus, Pipeline, PipelineId,
    PipelineStatus, Stage, StageId, StageStatus, TemplateId, TemplateJobId,
};
use rusqlite::types::Type;
use rusqlite::Row;
use std::str::FromStr;

/// Column list matching [`job_from_row`].
pub(crate) const JOB_COLUMNS: &str = "job_id, pipeline_id, stage_id, agent_type, prompt, \
     original_prompt, command, max_iterations, timeout_seconds, allowed_paths, \
     artifact_strategy, retry_strategy, template_job_id, parent_job_id, status, iteration, \
     retry_count, max_retries, termination_reason, job_output, created_at, updated_at, \
     started_at, completed_at";

fn conversion_err(e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
}

pub(crate) fn parse_status<T>(raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseStatusError>,
{
    raw.parse().map_err(conversion_err)
}

pub(crate) fn parse_json_opt(
    raw: Option<String>,
) -> rusqlite::Result<Option<serde_json::Value>> {
    match raw {
        None => Ok(None),
        Some(s) => serde_json::from_str(&s).map(Some).map_err(conversion_err),
    }
}

pub(crate) fn parse_string_list(raw: String) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(&raw).map_err(conversion_err)
}

pub(crate) fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        id: JobId::new(row.get::<_, String>("job_id")?),
        pipeline_id: PipelineId::new(row.get::<_, String>("pipeline_id")?),
        stage_id: StageId::new(row.get::<_, String>("stage_id")?),
        agent_type: row.get("agent_type")?,
        prompt: row.get("prompt")?,
        original_prompt: row.get("original_prompt")?,
        command: row.get("command")?,
        max_iterations: row.get("max_iterations")?,
        timeout_seconds: row.get("timeout_seconds")?,
        allowed_paths: parse_string_list(row.get("allowed_paths")?)?,
        artifact_strategy: parse_json_opt(row.get("artifact_strategy")?)?,
        retry_strategy: parse_json_opt(row.get("retry_strategy")?)?,
        template_job_id: row
            .get::<_, Option<String>>("template_job_id")?
            .map(TemplateJobId::new),
        parent_job_id: row.get::<_, Option<String>>("parent_job_id")?.map(JobId::new),
        status: parse_status::<JobStatus>(row.get("status")?)?,
        iteration: row.get("iteration")?,
        retry_count: row.get("retry_count")?,
        max_retries: row.get("max_retries")?,
        termination_reason: row.get("termination_reason")?,
        job_output: row.get("job_output")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        started_at: row.get("started_at")?,
        completed_at: row.get("completed_at")?,
    })
}

pub(crate) fn pipeline_from_row(row: &Row<'_>) -> rusqlite::Result<Pipeline> {
    Ok(Pipeline {
        id: PipelineId::new(row.get::<_, String>("pipeline_id")?),
        template_id: row
            .get::<_, Option<String>>("template_id")?
            .map(TemplateId::new),
        original_prompt: row.get("original_prompt")?,
        workspace_path: row.get("workspace_path")?,
        status: parse_status::<PipelineStatus>(row.get("status")?)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        completed_at: row.get("completed_at")?,
    })
}

pub(crate) fn stage_from_row(row: &Row<'_>) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: StageId::new(row.get::<_, String>("stage_id")?),
        pipeline_id: PipelineId::new(row.get::<_, String>("pipeline_id")?),
        name: row.get("name")?,
        stage_order: row.get("stage_order")?,
        status: parse_status::<StageStatus>(row.get("status")?)?,
        created_at: row.get("created_at")?,
    })
}

pub(crate) fn dependency_from_row(row: &Row<'_>) -> rusqlite::Result<JobDependency> {
    Ok(JobDependency {
        job_id: JobId::new(row.get::<_, String>("job_id")?),
        depends_on_job_id: JobId::new(row.get::<_, String>("depends_on_job_id")?),
        dependency_type: parse_status::<DependencyType>(row.get("dependency_type")?)?,
    })
}

pub(crate) fn artifact_from_row(row: &Row<'_>) -> rusqlite::Result<Artifact> {
    Ok(Artifact {
        id: clowder_core::artifact::ArtifactId::new(row.get::<_, String>("artifact_id")?),
        job_id: JobId::new(row.get::<_, String>("job_id")?),
        kind: row.get("type")?,
        name: row.get("name")?,
        description: row.get("description")?,
        file_path: row.get("file_path")?,
        content: row.get("content")?,
        content_hash: row.get("content_hash")?,
        size_bytes: row.get("size_bytes")?,
        metadata: parse_json_opt(row.get("metadata")?)?,
        created_at: row.get("created_at")?,
    })
}
