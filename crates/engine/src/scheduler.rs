// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic scheduler: promote pending pipelines, dispatch ready jobs, and
//! finalize finished pipelines.

use crate::executor::run_job;
use crate::propagate::check_pipeline_completion;
use clowder_core::{IdGen, JobId, PipelineId, UuidIdGen};
use clowder_store::Store;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Default tick cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Concurrent executor cap. One by policy: the agent substrate runs a
/// local model and destabilizes under concurrent invocations. The ready
/// query is correct for any cap.
pub const DEFAULT_MAX_WORKERS: usize = 1;

struct ActiveExecutor {
    pipeline_id: PipelineId,
    handle: JoinHandle<()>,
}

/// The orchestration loop. Jobs advance only through the periodic tick so
/// completions, multiplier spawns, and deadlock checks never interleave
/// through callbacks.
pub struct Scheduler<I: IdGen = UuidIdGen> {
    store: Store,
    ids: I,
    poll_interval: Duration,
    max_workers: usize,
    active: HashMap<JobId, ActiveExecutor>,
}

impl<I: IdGen> Scheduler<I> {
    pub fn new(store: Store, ids: I) -> Self {
        Self {
            store,
            ids,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_workers: DEFAULT_MAX_WORKERS,
            active: HashMap::new(),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Number of executors currently running.
    pub fn active_jobs(&self) -> usize {
        self.active.len()
    }

    /// Run ticks forever. Every phase of a tick catches and logs its own
    /// errors; one bad tick never stops the loop.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(
            interval_secs = self.poll_interval.as_secs(),
            max_workers = self.max_workers,
            "scheduler started"
        );
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One orchestration cycle: harvest finished executors, promote
    /// pending pipelines, dispatch ready jobs up to the worker cap, then
    /// run the completion check on quiescent running pipelines.
    pub async fn tick(&mut self) {
        self.active.retain(|_, executor| !executor.handle.is_finished());
        self.promote_pending();
        self.dispatch();
        self.finalize();
    }

    fn promote_pending(&self) {
        let pending = match self.store.pending_pipelines() {
            Ok(pending) => pending,
            Err(err) => {
                tracing::error!(error = %err, "could not list pending pipelines");
                return;
            }
        };
        for pipeline in pending {
            match self.store.mark_pipeline_running(&pipeline.id) {
                Ok(()) => {
                    tracing::info!(pipeline_id = %pipeline.id.short(8), "pipeline started");
                }
                Err(err) => {
                    tracing::error!(
                        pipeline_id = %pipeline.id.short(8),
                        error = %err,
                        "could not promote pipeline"
                    );
                }
            }
        }
    }

    fn dispatch(&mut self) {
        while self.active.len() < self.max_workers {
            let job = match self.store.ready_job() {
                Ok(Some(job)) => job,
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = %err, "ready-job query failed");
                    break;
                }
            };
            // A just-dispatched job stays `pending` until its executor
            // marks it running; don't double-dispatch it meanwhile.
            if self.active.contains_key(&job.id) {
                break;
            }
            tracing::info!(
                job_id = %job.id.short(8),
                pipeline_id = %job.pipeline_id.short(8),
                agent_type = %job.agent_type,
                "dispatching job"
            );
            let handle = tokio::spawn(run_job(
                self.store.clone(),
                self.ids.clone(),
                job.id.clone(),
            ));
            self.active.insert(
                job.id,
                ActiveExecutor {
                    pipeline_id: job.pipeline_id,
                    handle,
                },
            );
        }
    }

    fn finalize(&self) {
        let running = match self.store.running_pipelines() {
            Ok(running) => running,
            Err(err) => {
                tracing::error!(error = %err, "could not list running pipelines");
                return;
            }
        };
        for pipeline in running {
            // Statuses are in motion while an executor of this pipeline is
            // alive; check again once it settles.
            if self
                .active
                .values()
                .any(|executor| executor.pipeline_id == pipeline.id)
            {
                continue;
            }
            if let Err(err) = check_pipeline_completion(&self.store, &pipeline.id) {
                tracing::error!(
                    pipeline_id = %pipeline.id.short(8),
                    error = %err,
                    "pipeline completion check failed"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
