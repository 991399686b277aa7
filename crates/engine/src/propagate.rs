// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure propagation and pipeline finalization.

use crate::EngineError;
use clowder_core::status::DEPENDENCY_FAILED_REASON;
use clowder_core::{DependencyType, JobId, JobStatus, PipelineId, PipelineStatus};
use clowder_store::Store;
use std::collections::{HashSet, VecDeque};

/// Transitively skip pending dependents reachable from a failed job via
/// `success` edges. `failure` and `always` edges never cause skipping. The
/// whole cascade commits in one transaction; re-running on the same failed
/// job is a no-op because nothing reachable is still pending.
pub fn propagate_failure(store: &Store, failed_job_id: &JobId) -> Result<usize, EngineError> {
    let mut queue = VecDeque::from([failed_job_id.clone()]);
    let mut seen: HashSet<JobId> = HashSet::new();
    let mut to_skip: Vec<JobId> = Vec::new();

    while let Some(job_id) = queue.pop_front() {
        for dependent in store.list_dependents(&job_id, DependencyType::Success)? {
            if dependent.status == JobStatus::Pending && seen.insert(dependent.id.clone()) {
                to_skip.push(dependent.id.clone());
                queue.push_back(dependent.id);
            }
        }
    }

    let skipped = store.skip_jobs(&to_skip, DEPENDENCY_FAILED_REASON)?;
    if skipped > 0 {
        tracing::info!(
            failed_job_id = %failed_job_id.short(8),
            skipped,
            "skipped dependents of failed job"
        );
    }
    Ok(skipped)
}

/// Finalize a pipeline if it has reached a quiescent terminal shape.
///
/// All jobs terminal: the pipeline fails when any job failed, completes
/// otherwise. Still-pending jobs with no satisfiable path: deadlock — the
/// pipeline fails and every remaining pending job is skipped.
pub fn check_pipeline_completion(
    store: &Store,
    pipeline_id: &PipelineId,
) -> Result<(), EngineError> {
    let counts = store.job_counts(pipeline_id)?;

    if counts.all_done() {
        let status = if counts.failed > 0 {
            PipelineStatus::Failed
        } else {
            PipelineStatus::Completed
        };
        store.finalize_pipeline(pipeline_id, status)?;
        tracing::info!(
            pipeline_id = %pipeline_id.short(8),
            status = %status,
            failed = counts.failed,
            skipped = counts.skipped,
            "pipeline finished"
        );
    } else if counts.pending > 0 {
        let deadlocked = store.pending_jobs_with_blocking_deps(pipeline_id)?;
        if !deadlocked.is_empty() {
            tracing::warn!(
                pipeline_id = %pipeline_id.short(8),
                deadlocked = deadlocked.len(),
                "deadlocked jobs detected, failing pipeline"
            );
            store.finalize_deadlocked(pipeline_id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "propagate_tests.rs"]
mod tests;
