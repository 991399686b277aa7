// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for store tests.

use crate::Store;
use clowder_core::{
    DependencyType, FakeClock, JobDependency, JobId, NewJob, NewPipeline, NewStage, PipelineId,
    PipelinePlan, StageId,
};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) fn open_store() -> (TempDir, Store, FakeClock) {
    let dir = TempDir::new().unwrap();
    let clock = FakeClock::new();
    let store =
        Store::open_with_clock(dir.path().join("clowder.db"), Arc::new(clock.clone())).unwrap();
    store.init_schema().unwrap();
    (dir, store, clock)
}

pub(crate) fn new_job(id: &str, pipeline_id: &str, stage_id: &str) -> NewJob {
    NewJob {
        id: JobId::new(id),
        pipeline_id: PipelineId::new(pipeline_id),
        stage_id: StageId::new(stage_id),
        agent_type: "worker".to_string(),
        prompt: "do the thing".to_string(),
        command: Some("echo done".to_string()),
        max_iterations: 10,
        timeout_seconds: 600,
        allowed_paths: vec!["/workspace".to_string()],
        max_retries: 3,
        artifact_strategy: None,
        retry_strategy: None,
        template_job_id: None,
        parent_job_id: None,
    }
}

/// Build a one-stage plan with the given jobs and dependency edges.
pub(crate) fn simple_plan(
    pipeline_id: &str,
    job_ids: &[&str],
    deps: &[(&str, &str, DependencyType)],
) -> PipelinePlan {
    let stage_id = format!("{pipeline_id}-s1");
    PipelinePlan {
        pipeline: NewPipeline {
            id: PipelineId::new(pipeline_id),
            template_id: None,
            original_prompt: "build the feature".to_string(),
            workspace_path: "/workspace".to_string(),
        },
        stages: vec![NewStage {
            id: StageId::new(&stage_id),
            pipeline_id: PipelineId::new(pipeline_id),
            name: "work".to_string(),
            stage_order: 0,
        }],
        jobs: job_ids
            .iter()
            .map(|id| new_job(id, pipeline_id, &stage_id))
            .collect(),
        dependencies: deps
            .iter()
            .map(|(job, on, edge)| JobDependency {
                job_id: JobId::new(*job),
                depends_on_job_id: JobId::new(*on),
                dependency_type: *edge,
            })
            .collect(),
    }
}

/// Insert a plan and promote the pipeline to running.
pub(crate) fn running_plan(store: &Store, plan: &PipelinePlan) {
    store.insert_plan(plan).unwrap();
    store.mark_pipeline_running(&plan.pipeline.id).unwrap();
}
