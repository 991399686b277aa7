// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Business logic between the HTTP handlers and the store.

use crate::dto::{
    JobDetail, JobView, PipelineDetail, PipelineView, StageView, StartPipelineRequest,
    StartedPipeline, StoppedPipeline, TemplateDependencyView, TemplateDetails, TemplateJobView,
    TemplateStageView,
};
use crate::ApiError;
use clowder_core::{
    Pipeline, PipelineId, Template, TemplateId, TemplateJobId, TemplateStageId, UuidIdGen,
};
use clowder_engine::{instantiate, InstantiateRequest};
use clowder_store::Store;

/// Pipeline operations backing the HTTP surface.
#[derive(Clone)]
pub struct PipelineService {
    store: Store,
    ids: UuidIdGen,
}

impl PipelineService {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            ids: UuidIdGen,
        }
    }

    /// Template ids, ordered by template name.
    pub fn list_templates(&self) -> Result<Vec<String>, ApiError> {
        let summaries = self.store.list_templates()?;
        Ok(summaries.into_iter().map(|t| t.id.0).collect())
    }

    /// Full template shape, or `None` when unknown.
    pub fn template_details(&self, id: &str) -> Result<Option<TemplateDetails>, ApiError> {
        let template = match self.store.get_template(&TemplateId::new(id)) {
            Ok(template) => template,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(template_details(&template)))
    }

    /// Instantiate a pipeline from a template.
    pub fn start_pipeline(
        &self,
        template_id: &str,
        request: &StartPipelineRequest,
    ) -> Result<StartedPipeline, ApiError> {
        let instantiate_request = InstantiateRequest {
            template_id: TemplateId::new(template_id),
            original_prompt: request.prompt.clone(),
            workspace_path: request.workspace_path.clone(),
            excluded_stage_ids: request
                .excluded_stage_ids
                .iter()
                .map(TemplateStageId::new)
                .collect(),
            excluded_job_ids: request
                .excluded_job_ids
                .iter()
                .map(TemplateJobId::new)
                .collect(),
        };
        let pipeline_id = instantiate(&self.store, &self.ids, &instantiate_request)?;
        let pipeline = self.store.get_pipeline(&pipeline_id)?;
        tracing::info!(
            pipeline_id = %pipeline_id.short(8),
            template_id,
            "pipeline started via api"
        );
        Ok(StartedPipeline {
            pipeline_id: pipeline_id.0,
            template_id: template_id.to_string(),
            name: pipeline.display_name(),
            prompt: pipeline.original_prompt,
            status: pipeline.status.to_string(),
        })
    }

    /// Cancel a pipeline. Running attempts finish on their own; nothing
    /// new is dispatched.
    pub fn stop_pipeline(&self, pipeline_id: &str) -> Result<StoppedPipeline, ApiError> {
        let pipeline = self.store.cancel_pipeline(&PipelineId::new(pipeline_id))?;
        tracing::info!(pipeline_id = %pipeline.id.short(8), "pipeline stopped");
        let name = pipeline.display_name();
        Ok(StoppedPipeline {
            pipeline_id: pipeline.id.0,
            name,
            status: pipeline.status.to_string(),
        })
    }

    /// Pipelines that are pending or running, with full nested shape.
    pub fn running_pipelines(&self) -> Result<Vec<PipelineView>, ApiError> {
        let pipelines = self.store.active_pipelines()?;
        pipelines
            .iter()
            .map(|p| self.pipeline_view(p, false))
            .collect()
    }

    /// Recently finished pipelines, newest first.
    pub fn recent_pipelines(&self, limit: u32) -> Result<Vec<PipelineView>, ApiError> {
        let pipelines = self.store.recent_pipelines(limit)?;
        pipelines
            .iter()
            .map(|p| self.pipeline_view(p, true))
            .collect()
    }

    /// One pipeline with its jobs, or `None` when unknown.
    pub fn pipeline_detail(&self, id: &str) -> Result<Option<PipelineDetail>, ApiError> {
        let pipeline_id = PipelineId::new(id);
        let pipeline = match self.store.get_pipeline(&pipeline_id) {
            Ok(pipeline) => pipeline,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let stages = self.store.stages_for_pipeline(&pipeline_id)?;
        let mut jobs = Vec::new();
        for stage in &stages {
            for job in self.store.jobs_for_stage(&stage.id)? {
                jobs.push(JobDetail {
                    job,
                    stage_name: stage.name.clone(),
                    stage_order: stage.stage_order,
                });
            }
        }
        Ok(Some(PipelineDetail { pipeline, jobs }))
    }

    fn pipeline_view(
        &self,
        pipeline: &Pipeline,
        with_completed_at: bool,
    ) -> Result<PipelineView, ApiError> {
        let mut stages = Vec::new();
        for stage in self.store.stages_for_pipeline(&pipeline.id)? {
            let jobs = self
                .store
                .jobs_for_stage(&stage.id)?
                .into_iter()
                .map(|job| JobView {
                    name: job.agent_type,
                    status: job.status.to_string(),
                    log: job.job_output.unwrap_or_default(),
                    retries: job.retry_count,
                })
                .collect();
            stages.push(StageView {
                name: stage.name,
                jobs,
            });
        }
        Ok(PipelineView {
            id: pipeline.id.0.clone(),
            name: pipeline.display_name(),
            description: pipeline.original_prompt.clone(),
            status: pipeline.status.to_string(),
            completed_at: if with_completed_at {
                pipeline.completed_at.clone()
            } else {
                None
            },
            stages,
        })
    }
}

fn template_details(template: &Template) -> TemplateDetails {
    let stages = template
        .stages
        .iter()
        .map(|stage| TemplateStageView {
            id: stage.id.0.clone(),
            name: stage.name.clone(),
            jobs: stage
                .jobs
                .iter()
                .map(|job| TemplateJobView {
                    id: job.id.0.clone(),
                    agent_type: job.agent_type.clone(),
                    prompt_template: job.prompt_template.clone(),
                    dependencies: template
                        .dependencies
                        .iter()
                        .filter(|dep| dep.template_job_id == job.id)
                        .map(|dep| TemplateDependencyView {
                            depends_on: template
                                .job(&dep.depends_on_template_job_id)
                                .map(|target| target.agent_type.clone())
                                .unwrap_or_else(|| dep.depends_on_template_job_id.0.clone()),
                            dependency_type: dep.dependency_type.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    TemplateDetails {
        id: template.id.0.clone(),
        name: template.name.clone(),
        description: template.description.clone(),
        stages,
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
