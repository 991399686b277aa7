// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline and stage reads and lifecycle writes.

use crate::rows::{pipeline_from_row, stage_from_row};
use crate::{Store, StoreError};
use clowder_core::{Pipeline, PipelineId, PipelinePlan, PipelineStatus, Stage, StageStatus};
use clowder_core::status::DEADLOCKED_REASON;
use rusqlite::{params, OptionalExtension};

const PIPELINE_COLUMNS: &str = "pipeline_id, template_id, original_prompt, workspace_path, \
     status, created_at, updated_at, completed_at";

impl Store {
    /// Materialize a full pipeline plan in one transaction.
    pub fn insert_plan(&self, plan: &PipelinePlan) -> Result<(), StoreError> {
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO pipelines
                 (pipeline_id, template_id, original_prompt, workspace_path, status,
                  created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?5)",
            params![
                plan.pipeline.id.as_str(),
                plan.pipeline.template_id.as_ref().map(|t| t.as_str()),
                plan.pipeline.original_prompt,
                plan.pipeline.workspace_path,
                now
            ],
        )?;
        for stage in &plan.stages {
            tx.execute(
                "INSERT INTO stages (stage_id, pipeline_id, name, stage_order, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, 'pending', ?5)",
                params![
                    stage.id.as_str(),
                    stage.pipeline_id.as_str(),
                    stage.name,
                    stage.stage_order,
                    now
                ],
            )?;
        }
        for job in &plan.jobs {
            crate::jobs::insert_job(&tx, job, &now)?;
        }
        for dep in &plan.dependencies {
            crate::jobs::insert_dependency(&tx, dep)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn get_pipeline(&self, id: &PipelineId) -> Result<Pipeline, StoreError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE pipeline_id = ?1"),
            params![id.as_str()],
            pipeline_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("pipeline", id.as_str()))
    }

    pub fn pending_pipelines(&self) -> Result<Vec<Pipeline>, StoreError> {
        self.pipelines_with_status("status = 'pending'")
    }

    pub fn running_pipelines(&self) -> Result<Vec<Pipeline>, StoreError> {
        self.pipelines_with_status("status = 'running'")
    }

    /// Pipelines shown by the live view: not yet terminal.
    pub fn active_pipelines(&self) -> Result<Vec<Pipeline>, StoreError> {
        self.pipelines_with_status("status IN ('pending', 'running')")
    }

    fn pipelines_with_status(&self, predicate: &str) -> Result<Vec<Pipeline>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM pipelines WHERE {predicate} ORDER BY created_at"
        ))?;
        let pipelines = stmt
            .query_map([], pipeline_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pipelines)
    }

    /// Most recently finished pipelines (completed, failed, or cancelled).
    pub fn recent_pipelines(&self, limit: u32) -> Result<Vec<Pipeline>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PIPELINE_COLUMNS} FROM pipelines
             WHERE status IN ('completed', 'failed', 'cancelled')
             ORDER BY completed_at DESC
             LIMIT ?1"
        ))?;
        let pipelines = stmt
            .query_map(params![limit], pipeline_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pipelines)
    }

    /// Promote a pending pipeline to running; its pending stages follow.
    pub fn mark_pipeline_running(&self, id: &PipelineId) -> Result<(), StoreError> {
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE pipelines SET status = 'running', updated_at = ?1 WHERE pipeline_id = ?2",
            params![now, id.as_str()],
        )?;
        tx.execute(
            "UPDATE stages SET status = 'running' WHERE pipeline_id = ?1 AND status = 'pending'",
            params![id.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Cancel a pipeline. Running jobs are left to finish; the scheduler
    /// stops dispatching. Returns the updated row.
    pub fn cancel_pipeline(&self, id: &PipelineId) -> Result<Pipeline, StoreError> {
        let now = self.timestamp();
        {
            let conn = self.lock();
            let changed = conn.execute(
                "UPDATE pipelines SET status = 'cancelled', updated_at = ?1
                 WHERE pipeline_id = ?2",
                params![now, id.as_str()],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found("pipeline", id.as_str()));
            }
        }
        self.get_pipeline(id)
    }

    /// Record a pipeline's terminal status; stages mirror it.
    pub fn finalize_pipeline(
        &self,
        id: &PipelineId,
        status: PipelineStatus,
    ) -> Result<(), StoreError> {
        let stage_status = match status {
            PipelineStatus::Failed => StageStatus::Failed,
            _ => StageStatus::Completed,
        };
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE pipelines SET status = ?1, completed_at = ?2, updated_at = ?2
             WHERE pipeline_id = ?3",
            params![status.as_str(), now, id.as_str()],
        )?;
        tx.execute(
            "UPDATE stages SET status = ?1 WHERE pipeline_id = ?2",
            params![stage_status.as_str(), id.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Deadlock finalization: the pipeline fails and every job still
    /// pending is skipped, in one transaction. Returns the skip count.
    pub fn finalize_deadlocked(&self, id: &PipelineId) -> Result<usize, StoreError> {
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let skipped = tx.execute(
            "UPDATE jobs
             SET status = 'skipped', termination_reason = ?1, completed_at = ?2, updated_at = ?2
             WHERE pipeline_id = ?3 AND status = 'pending'",
            params![DEADLOCKED_REASON, now, id.as_str()],
        )?;
        tx.execute(
            "UPDATE pipelines SET status = 'failed', completed_at = ?1, updated_at = ?1
             WHERE pipeline_id = ?2",
            params![now, id.as_str()],
        )?;
        tx.execute(
            "UPDATE stages SET status = 'failed' WHERE pipeline_id = ?1",
            params![id.as_str()],
        )?;
        tx.commit()?;
        Ok(skipped)
    }

    pub fn stages_for_pipeline(&self, id: &PipelineId) -> Result<Vec<Stage>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT stage_id, pipeline_id, name, stage_order, status, created_at
             FROM stages WHERE pipeline_id = ?1 ORDER BY stage_order",
        )?;
        let stages = stmt
            .query_map(params![id.as_str()], stage_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stages)
    }

    /// Stage of a pipeline at the given order, if materialized.
    pub fn stage_at_order(
        &self,
        pipeline_id: &PipelineId,
        stage_order: i64,
    ) -> Result<Option<Stage>, StoreError> {
        let conn = self.lock();
        let stage = conn
            .query_row(
                "SELECT stage_id, pipeline_id, name, stage_order, status, created_at
                 FROM stages WHERE pipeline_id = ?1 AND stage_order = ?2",
                params![pipeline_id.as_str(), stage_order],
                stage_from_row,
            )
            .optional()?;
        Ok(stage)
    }
}

#[cfg(test)]
#[path = "pipelines_tests.rs"]
mod tests;
