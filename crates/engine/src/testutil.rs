// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use clowder_core::{
    DependencyType, JobDependency, JobId, NewJob, NewPipeline, NewStage, PipelineId, PipelinePlan,
    StageId, Template, TemplateDependency, TemplateId, TemplateJob, TemplateJobId, TemplateStage,
    TemplateStageId,
};
use clowder_store::Store;
use tempfile::TempDir;

pub(crate) fn open_store() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("clowder.db")).unwrap();
    store.init_schema().unwrap();
    (dir, store)
}

pub(crate) fn shell_job(id: &str, pipeline_id: &str, stage_id: &str, command: &str) -> NewJob {
    NewJob {
        id: JobId::new(id),
        pipeline_id: PipelineId::new(pipeline_id),
        stage_id: StageId::new(stage_id),
        agent_type: "worker".to_string(),
        prompt: "do the thing".to_string(),
        command: Some(command.to_string()),
        max_iterations: 10,
        timeout_seconds: 600,
        allowed_paths: vec!["/workspace".to_string()],
        max_retries: 0,
        artifact_strategy: None,
        retry_strategy: None,
        template_job_id: None,
        parent_job_id: None,
    }
}

/// One-stage plan over an explicit workspace, with shell jobs and edges.
pub(crate) fn shell_plan(
    pipeline_id: &str,
    workspace: &str,
    jobs: Vec<NewJob>,
    deps: &[(&str, &str, DependencyType)],
) -> PipelinePlan {
    PipelinePlan {
        pipeline: NewPipeline {
            id: PipelineId::new(pipeline_id),
            template_id: None,
            original_prompt: "build the feature".to_string(),
            workspace_path: workspace.to_string(),
        },
        stages: vec![NewStage {
            id: StageId::new(format!("{pipeline_id}-s1")),
            pipeline_id: PipelineId::new(pipeline_id),
            name: "work".to_string(),
            stage_order: 0,
        }],
        jobs,
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

pub(crate) fn insert_running(store: &Store, plan: &PipelinePlan) {
    store.insert_plan(plan).unwrap();
    store.mark_pipeline_running(&plan.pipeline.id).unwrap();
}

pub(crate) fn template_job(id: &str, stage_id: &str, agent_type: &str, prompt: &str) -> TemplateJob {
    TemplateJob {
        id: TemplateJobId::new(id),
        template_stage_id: TemplateStageId::new(stage_id),
        agent_type: agent_type.to_string(),
        prompt_template: prompt.to_string(),
        command_template: None,
        max_iterations: 10,
        timeout_seconds: 600,
        max_retries: None,
        artifact_strategy: None,
        retry_strategy: None,
        job_multiplier: None,
    }
}

/// Two-stage planner/worker template where the worker declares a multiplier
/// over the planner's final output.
pub(crate) fn fanout_template() -> Template {
    let mut planner = template_job("tj-plan", "ts-plan", "planner", "plan: {{original_prompt}}");
    planner.artifact_strategy = Some(serde_json::json!({"type": "stdout_final"}));

    let mut worker = template_job("tj-work", "ts-work", "worker", "work: {{original_prompt}}");
    worker.job_multiplier = Some(serde_json::json!({
        "source_template_job_id": "tj-plan",
        "parse_strategy": "json_array",
        "prompt_template": "do {{item}}",
    }));

    Template {
        id: TemplateId::new("tmpl-fanout"),
        name: "Fan-out fixture".to_string(),
        description: "planner feeds a multiplied worker".to_string(),
        stages: vec![
            TemplateStage {
                id: TemplateStageId::new("ts-plan"),
                template_id: TemplateId::new("tmpl-fanout"),
                name: "planning".to_string(),
                stage_order: 0,
                jobs: vec![planner],
            },
            TemplateStage {
                id: TemplateStageId::new("ts-work"),
                template_id: TemplateId::new("tmpl-fanout"),
                name: "execution".to_string(),
                stage_order: 1,
                jobs: vec![worker],
            },
        ],
        dependencies: vec![TemplateDependency {
            template_job_id: TemplateJobId::new("tj-work"),
            depends_on_template_job_id: TemplateJobId::new("tj-plan"),
            dependency_type: DependencyType::Success,
        }],
    }
}
