// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template instantiation: materialize a template DAG into concrete
//! pipeline, stage, job, and dependency rows.

use crate::EngineError;
use clowder_core::{
    substitute, IdGen, JobDependency, JobId, NewJob, NewPipeline, NewStage, PipelineId,
    PipelinePlan, StageId, Template, TemplateId, TemplateJobId, TemplateStageId,
};
use clowder_store::Store;
use std::collections::HashMap;

/// Retry ceiling applied when a template job does not specify one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Inputs for instantiating one pipeline from a template.
#[derive(Debug, Clone)]
pub struct InstantiateRequest {
    pub template_id: TemplateId,
    pub original_prompt: String,
    pub workspace_path: String,
    pub excluded_stage_ids: Vec<TemplateStageId>,
    pub excluded_job_ids: Vec<TemplateJobId>,
}

impl InstantiateRequest {
    pub fn new(
        template_id: impl Into<TemplateId>,
        original_prompt: impl Into<String>,
        workspace_path: impl Into<String>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            original_prompt: original_prompt.into(),
            workspace_path: workspace_path.into(),
            excluded_stage_ids: Vec::new(),
            excluded_job_ids: Vec::new(),
        }
    }
}

/// Compute the full materialization of a template. Pure: all ids are drawn
/// from the generator, placeholders are substituted, exclusions applied,
/// and only edges with both endpoints materialized survive. Exclusions can
/// only remove nodes and edges, so the result stays acyclic.
pub fn plan_pipeline(
    template: &Template,
    request: &InstantiateRequest,
    ids: &impl IdGen,
) -> PipelinePlan {
    let pipeline_id = PipelineId::new(ids.next());
    let mut stages = Vec::new();
    let mut jobs = Vec::new();
    let mut job_map: HashMap<TemplateJobId, JobId> = HashMap::new();

    for template_stage in &template.stages {
        if request.excluded_stage_ids.contains(&template_stage.id) {
            continue;
        }
        let stage_id = StageId::new(ids.next());
        stages.push(NewStage {
            id: stage_id.clone(),
            pipeline_id: pipeline_id.clone(),
            name: template_stage.name.clone(),
            stage_order: template_stage.stage_order,
        });

        for template_job in &template_stage.jobs {
            if request.excluded_job_ids.contains(&template_job.id) {
                continue;
            }
            let job_id = JobId::new(ids.next());
            let prompt = substitute(
                &template_job.prompt_template,
                &[("original_prompt", &request.original_prompt)],
            );
            let command = template_job.command_template.as_ref().map(|tpl| {
                substitute(
                    tpl,
                    &[
                        ("job_id", job_id.as_str()),
                        ("prompt", &prompt),
                        ("agent_type", &template_job.agent_type),
                    ],
                )
            });
            jobs.push(NewJob {
                id: job_id.clone(),
                pipeline_id: pipeline_id.clone(),
                stage_id: stage_id.clone(),
                agent_type: template_job.agent_type.clone(),
                prompt,
                command,
                max_iterations: template_job.max_iterations,
                timeout_seconds: template_job.timeout_seconds,
                allowed_paths: vec![request.workspace_path.clone()],
                max_retries: template_job.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
                artifact_strategy: template_job.artifact_strategy.clone(),
                retry_strategy: template_job.retry_strategy.clone(),
                template_job_id: Some(template_job.id.clone()),
                parent_job_id: None,
            });
            job_map.insert(template_job.id.clone(), job_id);
        }
    }

    let dependencies = template
        .dependencies
        .iter()
        .filter_map(|dep| {
            let job_id = job_map.get(&dep.template_job_id)?;
            let depends_on = job_map.get(&dep.depends_on_template_job_id)?;
            Some(JobDependency {
                job_id: job_id.clone(),
                depends_on_job_id: depends_on.clone(),
                dependency_type: dep.dependency_type,
            })
        })
        .collect();

    PipelinePlan {
        pipeline: NewPipeline {
            id: pipeline_id,
            template_id: Some(template.id.clone()),
            original_prompt: request.original_prompt.clone(),
            workspace_path: request.workspace_path.clone(),
        },
        stages,
        jobs,
        dependencies,
    }
}

/// Load the template, compute its plan, and insert everything in one
/// transaction. Returns the new pipeline id.
pub fn instantiate(
    store: &Store,
    ids: &impl IdGen,
    request: &InstantiateRequest,
) -> Result<PipelineId, EngineError> {
    let template = store.get_template(&request.template_id)?;
    let plan = plan_pipeline(&template, request, ids);
    store.insert_plan(&plan)?;
    tracing::info!(
        pipeline_id = %plan.pipeline.id.short(8),
        template_id = %template.id,
        jobs = plan.jobs.len(),
        "pipeline instantiated"
    );
    Ok(plan.pipeline.id)
}

#[cfg(test)]
#[path = "instantiate_tests.rs"]
mod tests;
