// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler queries: ready-job selection, deadlock detection, and
//! completion accounting.

use crate::rows::{job_from_row, JOB_COLUMNS};
use crate::{Store, StoreError};
use clowder_core::{Job, JobId, PipelineId, TemplateJobId};
use rusqlite::{params, OptionalExtension};

/// Per-pipeline job status tally used by the completion check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobCounts {
    pub total: i64,
    pub done: i64,
    pub failed: i64,
    pub skipped: i64,
    pub pending: i64,
}

impl JobCounts {
    pub fn all_done(&self) -> bool {
        self.total == self.done
    }
}

impl Store {
    /// The next dispatchable job across all running pipelines, if any: a
    /// pending job whose every incoming edge precondition holds.
    /// Deterministic tie-break: oldest pipeline, lowest stage order, oldest
    /// job (insertion order breaks exact timestamp ties).
    pub fn ready_job(&self) -> Result<Option<Job>, StoreError> {
        let conn = self.lock();
        let job = conn
            .query_row(
                &format!(
                    "SELECT {cols} FROM jobs j
                     JOIN pipelines p ON p.pipeline_id = j.pipeline_id
                     JOIN stages s ON s.stage_id = j.stage_id
                     WHERE p.status = 'running'
                       AND j.status = 'pending'
                       AND NOT EXISTS (
                           SELECT 1 FROM job_dependencies jd
                           JOIN jobs dep ON dep.job_id = jd.depends_on_job_id
                           WHERE jd.job_id = j.job_id
                             AND NOT (
                                 (jd.dependency_type = 'success' AND dep.status = 'completed')
                                 OR (jd.dependency_type = 'failure' AND dep.status = 'failed')
                                 OR (jd.dependency_type = 'always'
                                     AND dep.status IN ('completed', 'failed'))
                             )
                       )
                     ORDER BY p.created_at, s.stage_order, j.created_at, j.rowid
                     LIMIT 1",
                    cols = qualified_job_columns()
                ),
                [],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    /// Pending jobs of a pipeline that can never run: each has at least one
    /// incoming edge, and none of its edges is potentially satisfiable (the
    /// source is no longer in motion and the terminal precondition failed).
    pub fn pending_jobs_with_blocking_deps(
        &self,
        pipeline_id: &PipelineId,
    ) -> Result<Vec<JobId>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT j.job_id FROM jobs j
             WHERE j.pipeline_id = ?1
               AND j.status = 'pending'
               AND EXISTS (SELECT 1 FROM job_dependencies WHERE job_id = j.job_id)
               AND NOT EXISTS (
                   SELECT 1 FROM job_dependencies jd
                   JOIN jobs dep ON dep.job_id = jd.depends_on_job_id
                   WHERE jd.job_id = j.job_id
                     AND (
                         dep.status IN ('pending', 'running')
                         OR (jd.dependency_type = 'success' AND dep.status = 'completed')
                         OR (jd.dependency_type = 'failure' AND dep.status = 'failed')
                         OR (jd.dependency_type = 'always'
                             AND dep.status IN ('completed', 'failed'))
                     )
               )
             ORDER BY j.created_at, j.rowid",
        )?;
        let ids = stmt
            .query_map(params![pipeline_id.as_str()], |row| {
                Ok(JobId::new(row.get::<_, String>(0)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Status tally for a pipeline's jobs.
    pub fn job_counts(&self, pipeline_id: &PipelineId) -> Result<JobCounts, StoreError> {
        let conn = self.lock();
        let counts = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status IN ('completed', 'failed', 'skipped')), 0),
                    COALESCE(SUM(status = 'failed'), 0),
                    COALESCE(SUM(status = 'skipped'), 0),
                    COALESCE(SUM(status = 'pending'), 0)
             FROM jobs WHERE pipeline_id = ?1",
            params![pipeline_id.as_str()],
            |row| {
                Ok(JobCounts {
                    total: row.get(0)?,
                    done: row.get(1)?,
                    failed: row.get(2)?,
                    skipped: row.get(3)?,
                    pending: row.get(4)?,
                })
            },
        )?;
        Ok(counts)
    }

    /// Multiplier idempotency guard: whether children were already spawned
    /// for this concrete parent and declaring template job.
    pub fn children_spawned(
        &self,
        parent_job_id: &JobId,
        template_job_id: &TemplateJobId,
    ) -> Result<bool, StoreError> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE parent_job_id = ?1 AND template_job_id = ?2",
            params![parent_job_id.as_str(), template_job_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// Job columns qualified with the `j.` alias for joined queries.
fn qualified_job_columns() -> String {
    JOB_COLUMNS
        .split(", ")
        .map(|c| format!("j.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "queries_tests.rs"]
mod tests;
