// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job reads and status-transition writes.
//!
//! Transitions maintain the timestamp invariant: `pending` rows have no
//! `started_at`, `running` rows have one, and terminal rows always carry a
//! `completed_at`.

use crate::rows::{dependency_from_row, job_from_row, JOB_COLUMNS};
use crate::{Store, StoreError};
use clowder_core::status::SUCCESS_REASON;
use clowder_core::{DependencyType, Job, JobDependency, JobId, NewJob, PipelineId, StageId};
use rusqlite::{params, OptionalExtension, Transaction};

pub(crate) fn insert_job(
    tx: &Transaction<'_>,
    job: &NewJob,
    now: &str,
) -> Result<(), StoreError> {
    let allowed = serde_json::to_string(&job.allowed_paths)?;
    tx.execute(
        "INSERT INTO jobs (
             job_id, pipeline_id, stage_id, agent_type, prompt, original_prompt, command,
             max_iterations, timeout_seconds, allowed_paths, artifact_strategy, retry_strategy,
             template_job_id, parent_job_id, max_retries, status, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                   'pending', ?15, ?15)",
        params![
            job.id.as_str(),
            job.pipeline_id.as_str(),
            job.stage_id.as_str(),
            job.agent_type,
            job.prompt,
            job.command,
            job.max_iterations,
            job.timeout_seconds,
            allowed,
            job.artifact_strategy.as_ref().map(|v| v.to_string()),
            job.retry_strategy.as_ref().map(|v| v.to_string()),
            job.template_job_id.as_ref().map(|t| t.as_str()),
            job.parent_job_id.as_ref().map(|p| p.as_str()),
            job.max_retries,
            now
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_dependency(
    tx: &Transaction<'_>,
    dep: &JobDependency,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO job_dependencies (job_id, depends_on_job_id, dependency_type)
         VALUES (?1, ?2, ?3)",
        params![
            dep.job_id.as_str(),
            dep.depends_on_job_id.as_str(),
            dep.dependency_type.as_str()
        ],
    )?;
    Ok(())
}

impl Store {
    pub fn get_job(&self, id: &JobId) -> Result<Job, StoreError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {JOB_COLUMNS} FROM jobs WHERE job_id = ?1"),
            params![id.as_str()],
            job_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("job", id.as_str()))
    }

    pub fn jobs_for_pipeline(&self, id: &PipelineId) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE pipeline_id = ?1 ORDER BY created_at, job_id"
        ))?;
        let jobs = stmt
            .query_map(params![id.as_str()], job_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jobs)
    }

    pub fn jobs_for_stage(&self, id: &StageId) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE stage_id = ?1 ORDER BY created_at, job_id"
        ))?;
        let jobs = stmt
            .query_map(params![id.as_str()], job_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jobs)
    }

    /// Insert multiplier-spawned jobs and their dependency edges in one
    /// transaction.
    pub fn insert_jobs_with_deps(
        &self,
        jobs: &[NewJob],
        deps: &[JobDependency],
    ) -> Result<(), StoreError> {
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for job in jobs {
            insert_job(&tx, job, &now)?;
        }
        for dep in deps {
            insert_dependency(&tx, dep)?;
        }
        tx.commit()?;
        Ok(())
    }

    /// `pending` → `running`, stamping `started_at`.
    pub fn mark_job_running(&self, id: &JobId) -> Result<(), StoreError> {
        let now = self.timestamp();
        self.lock().execute(
            "UPDATE jobs SET status = 'running', started_at = ?1, updated_at = ?1
             WHERE job_id = ?2",
            params![now, id.as_str()],
        )?;
        Ok(())
    }

    /// Persist an augmented prompt so the subprocess (and later retries)
    /// observe it.
    pub fn update_job_prompt(&self, id: &JobId, prompt: &str) -> Result<(), StoreError> {
        let now = self.timestamp();
        self.lock().execute(
            "UPDATE jobs SET prompt = ?1, updated_at = ?2 WHERE job_id = ?3",
            params![prompt, now, id.as_str()],
        )?;
        Ok(())
    }

    /// `running` → `completed` with the attempt's accumulated output.
    pub fn complete_job(&self, id: &JobId, output: &str) -> Result<(), StoreError> {
        let now = self.timestamp();
        self.lock().execute(
            "UPDATE jobs
             SET status = 'completed', termination_reason = ?1, job_output = ?2,
                 completed_at = ?3, updated_at = ?3
             WHERE job_id = ?4",
            params![SUCCESS_REASON, output, now, id.as_str()],
        )?;
        Ok(())
    }

    /// `running` → `failed` with a terminal reason.
    pub fn fail_job(
        &self,
        id: &JobId,
        reason: &str,
        output: Option<&str>,
    ) -> Result<(), StoreError> {
        let now = self.timestamp();
        self.lock().execute(
            "UPDATE jobs
             SET status = 'failed', termination_reason = ?1,
                 job_output = COALESCE(?2, job_output),
                 completed_at = ?3, updated_at = ?3
             WHERE job_id = ?4",
            params![reason, output, now, id.as_str()],
        )?;
        Ok(())
    }

    /// `running` → `pending` after a retryable attempt failure. The
    /// attempt's output is kept so a context-carrying retry can replay it.
    pub fn requeue_job_for_retry(&self, id: &JobId, output: &str) -> Result<(), StoreError> {
        let now = self.timestamp();
        self.lock().execute(
            "UPDATE jobs
             SET status = 'pending', retry_count = retry_count + 1, job_output = ?1,
                 started_at = NULL, updated_at = ?2
             WHERE job_id = ?3",
            params![output, now, id.as_str()],
        )?;
        Ok(())
    }

    /// Skip a set of still-pending jobs in one transaction.
    pub fn skip_jobs(&self, ids: &[JobId], reason: &str) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let mut skipped = 0;
        for id in ids {
            skipped += tx.execute(
                "UPDATE jobs
                 SET status = 'skipped', termination_reason = ?1, completed_at = ?2,
                     updated_at = ?2
                 WHERE job_id = ?3 AND status = 'pending'",
                params![reason, now, id.as_str()],
            )?;
        }
        tx.commit()?;
        Ok(skipped)
    }

    /// Incoming dependency edges of a job.
    pub fn dependencies_of(&self, id: &JobId) -> Result<Vec<JobDependency>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT job_id, depends_on_job_id, dependency_type
             FROM job_dependencies WHERE job_id = ?1",
        )?;
        let deps = stmt
            .query_map(params![id.as_str()], dependency_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(deps)
    }

    /// Jobs depending on the given job via edges of one type.
    pub fn list_dependents(
        &self,
        id: &JobId,
        edge: DependencyType,
    ) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs
             WHERE job_id IN (
                 SELECT job_id FROM job_dependencies
                 WHERE depends_on_job_id = ?1 AND dependency_type = ?2
             )
             ORDER BY created_at, job_id"
        ))?;
        let jobs = stmt
            .query_map(params![id.as_str(), edge.as_str()], job_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jobs)
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
