// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template reads and writes.

use crate::rows::{parse_json_opt, parse_status};
use crate::{Store, StoreError};
use clowder_core::{
    DependencyType, Template, TemplateDependency, TemplateId, TemplateJob, TemplateJobId,
    TemplateStage, TemplateStageId,
};
use rusqlite::{params, OptionalExtension, Row};

/// One line of the template listing: identity plus shape counts.
#[derive(Debug, Clone)]
pub struct TemplateSummary {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub stage_count: i64,
    pub job_count: i64,
}

fn template_job_from_row(row: &Row<'_>) -> rusqlite::Result<TemplateJob> {
    Ok(TemplateJob {
        id: TemplateJobId::new(row.get::<_, String>("template_job_id")?),
        template_stage_id: TemplateStageId::new(row.get::<_, String>("template_stage_id")?),
        agent_type: row.get("agent_type")?,
        prompt_template: row.get("prompt_template")?,
        command_template: row.get("command_template")?,
        max_iterations: row.get("max_iterations")?,
        timeout_seconds: row.get("timeout_seconds")?,
        max_retries: row.get("max_retries")?,
        artifact_strategy: parse_json_opt(row.get("artifact_strategy")?)?,
        retry_strategy: parse_json_opt(row.get("retry_strategy")?)?,
        job_multiplier: parse_json_opt(row.get("job_multiplier")?)?,
    })
}

impl Store {
    /// List all templates with their stage and job counts, ordered by name.
    pub fn list_templates(&self) -> Result<Vec<TemplateSummary>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT t.template_id, t.name, t.description,
                    COUNT(DISTINCT ts.template_stage_id) AS stage_count,
                    COUNT(DISTINCT tj.template_job_id) AS job_count
             FROM pipeline_templates t
             LEFT JOIN template_stages ts ON ts.template_id = t.template_id
             LEFT JOIN template_jobs tj ON tj.template_stage_id = ts.template_stage_id
             GROUP BY t.template_id
             ORDER BY t.name",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(TemplateSummary {
                    id: TemplateId::new(row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    stage_count: row.get(3)?,
                    job_count: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Load a full template: stages in order, their jobs, and all
    /// dependency edges.
    pub fn get_template(&self, id: &TemplateId) -> Result<Template, StoreError> {
        let conn = self.lock();
        let header = conn
            .query_row(
                "SELECT name, description FROM pipeline_templates WHERE template_id = ?1",
                params![id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((name, description)) = header else {
            return Err(StoreError::not_found("template", id.as_str()));
        };

        let mut stage_stmt = conn.prepare(
            "SELECT template_stage_id, template_id, name, stage_order
             FROM template_stages WHERE template_id = ?1 ORDER BY stage_order",
        )?;
        let mut stages = stage_stmt
            .query_map(params![id.as_str()], |row| {
                Ok(TemplateStage {
                    id: TemplateStageId::new(row.get::<_, String>(0)?),
                    template_id: TemplateId::new(row.get::<_, String>(1)?),
                    name: row.get(2)?,
                    stage_order: row.get(3)?,
                    jobs: Vec::new(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut job_stmt = conn.prepare(
            "SELECT template_job_id, template_stage_id, agent_type, prompt_template,
                    command_template, max_iterations, timeout_seconds, max_retries,
                    artifact_strategy, retry_strategy, job_multiplier
             FROM template_jobs WHERE template_stage_id = ?1
             ORDER BY template_job_id",
        )?;
        for stage in &mut stages {
            stage.jobs = job_stmt
                .query_map(params![stage.id.as_str()], template_job_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
        }

        let mut dep_stmt = conn.prepare(
            "SELECT tjd.template_job_id, tjd.depends_on_template_job_id, tjd.dependency_type
             FROM template_job_dependencies tjd
             JOIN template_jobs tj ON tj.template_job_id = tjd.template_job_id
             JOIN template_stages ts ON ts.template_stage_id = tj.template_stage_id
             WHERE ts.template_id = ?1",
        )?;
        let dependencies = dep_stmt
            .query_map(params![id.as_str()], |row| {
                Ok(TemplateDependency {
                    template_job_id: TemplateJobId::new(row.get::<_, String>(0)?),
                    depends_on_template_job_id: TemplateJobId::new(row.get::<_, String>(1)?),
                    dependency_type: parse_status::<DependencyType>(row.get(2)?)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Template {
            id: id.clone(),
            name,
            description,
            stages,
            dependencies,
        })
    }

    /// Insert a full template in one transaction. Used by tests and by
    /// operators registering templates programmatically; production seeds
    /// arrive via `seeds.sql`.
    pub fn insert_template(&self, template: &Template) -> Result<(), StoreError> {
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO pipeline_templates (template_id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![template.id.as_str(), template.name, template.description, now],
        )?;
        for stage in &template.stages {
            tx.execute(
                "INSERT INTO template_stages (template_stage_id, template_id, name, stage_order)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    stage.id.as_str(),
                    template.id.as_str(),
                    stage.name,
                    stage.stage_order
                ],
            )?;
            for job in &stage.jobs {
                tx.execute(
                    "INSERT INTO template_jobs (
                         template_job_id, template_stage_id, agent_type, prompt_template,
                         command_template, max_iterations, timeout_seconds, max_retries,
                         artifact_strategy, retry_strategy, job_multiplier
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        job.id.as_str(),
                        stage.id.as_str(),
                        job.agent_type,
                        job.prompt_template,
                        job.command_template,
                        job.max_iterations,
                        job.timeout_seconds,
                        job.max_retries,
                        job.artifact_strategy.as_ref().map(|v| v.to_string()),
                        job.retry_strategy.as_ref().map(|v| v.to_string()),
                        job.job_multiplier.as_ref().map(|v| v.to_string()),
                    ],
                )?;
            }
        }
        for dep in &template.dependencies {
            tx.execute(
                "INSERT INTO template_job_dependencies
                     (template_job_id, depends_on_template_job_id, dependency_type)
                 VALUES (?1, ?2, ?3)",
                params![
                    dep.template_job_id.as_str(),
                    dep.depends_on_template_job_id.as_str(),
                    dep.dependency_type.as_str()
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Template jobs of a template that declare a job multiplier.
    pub fn multiplier_template_jobs(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<(TemplateJob, i64)>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT tj.template_job_id, tj.template_stage_id, tj.agent_type, tj.prompt_template,
                    tj.command_template, tj.max_iterations, tj.timeout_seconds, tj.max_retries,
                    tj.artifact_strategy, tj.retry_strategy, tj.job_multiplier,
                    ts.stage_order
             FROM template_jobs tj
             JOIN template_stages ts ON ts.template_stage_id = tj.template_stage_id
             WHERE ts.template_id = ?1 AND tj.job_multiplier IS NOT NULL",
        )?;
        let jobs = stmt
            .query_map(params![template_id.as_str()], |row| {
                Ok((template_job_from_row(row)?, row.get::<_, i64>("stage_order")?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jobs)
    }
}

#[cfg(test)]
#[path = "templates_tests.rs"]
mod tests;
