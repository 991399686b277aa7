// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job executor: one subprocess attempt per invocation.
//!
//! The command runs through a shell with stdout and stderr merged into one
//! accumulated log. Exit code is the sole success signal. A failed attempt
//! with retry budget left re-queues the job as `pending`; the terminal
//! transitions also drive artifact collection, multiplier fan-out, and
//! failure propagation. Internal errors fail the job instead of escaping.

use crate::collector::{collect_artifacts, WorkspaceSnapshot};
use crate::multiplier::spawn_children;
use crate::propagate::propagate_failure;
use crate::EngineError;
use clowder_core::{ArtifactStrategyConfig, IdGen, JobId, RetryStrategy};
use clowder_store::Store;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::Command;

/// How an attempt's subprocess ended.
enum AttemptEnd {
    Exited(i32),
    TimedOut,
}

/// Run one attempt of a job to a status transition. Never returns an
/// error: anything unexpected marks the job failed and propagates.
pub async fn run_job<I: IdGen>(store: Store, ids: I, job_id: JobId) {
    if let Err(err) = run_attempt(&store, &ids, &job_id).await {
        tracing::error!(
            job_id = %job_id.short(8),
            error = %err,
            "executor error, failing job"
        );
        if let Err(store_err) = store.fail_job(&job_id, &err.to_string(), None) {
            tracing::error!(
                job_id = %job_id.short(8),
                error = %store_err,
                "could not record job failure"
            );
            return;
        }
        if let Err(prop_err) = propagate_failure(&store, &job_id) {
            tracing::error!(
                job_id = %job_id.short(8),
                error = %prop_err,
                "failure propagation failed"
            );
        }
    }
}

async fn run_attempt(
    store: &Store,
    ids: &impl IdGen,
    job_id: &JobId,
) -> Result<(), EngineError> {
    let mut job = store.get_job(job_id)?;
    let pipeline = store.get_pipeline(&job.pipeline_id)?;

    // Rebuild the prompt from the previous attempt's output before the
    // subprocess can observe it. original_prompt stays the true input.
    if job.retry_count > 0 {
        let retry = RetryStrategy::resolve(job.retry_strategy.as_ref());
        if let Some(previous) = job.job_output.clone() {
            if let Some(augmented) = retry.augment_prompt(&previous, &job.original_prompt) {
                store.update_job_prompt(job_id, &augmented)?;
                tracing::info!(
                    job_id = %job_id.short(8),
                    context_bytes = previous.len(),
                    "retrying with previous attempt output as context"
                );
                job.prompt = augmented;
            }
        }
    }

    store.mark_job_running(job_id)?;

    let command = job.effective_command();
    let workspace = PathBuf::from(&pipeline.workspace_path);
    let strategy = ArtifactStrategyConfig::resolve(job.artifact_strategy.as_ref());
    let snapshot = if strategy.uses_workspace_delta() && workspace.is_dir() {
        match WorkspaceSnapshot::capture(&workspace) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(
                    job_id = %job_id.short(8),
                    error = %err,
                    "workspace snapshot failed, delta collection disabled for this attempt"
                );
                None
            }
        }
    } else {
        None
    };

    tracing::info!(
        job_id = %job_id.short(8),
        %command,
        attempt = job.attempt(),
        max_attempts = job.max_retries + 1,
        "running job"
    );

    let timeout = Duration::from_secs(job.timeout_seconds);
    let (end, log) = run_subprocess(job_id, &command, &workspace, timeout).await?;

    match end {
        AttemptEnd::Exited(0) => {
            store.complete_job(job_id, &log)?;
            tracing::info!(job_id = %job_id.short(8), "job completed");

            let completed = store.get_job(job_id)?;
            match collect_artifacts(store, ids, &completed, &workspace, snapshot.as_ref(), &log) {
                Ok(artifacts) if !artifacts.is_empty() => {
                    tracing::info!(
                        job_id = %job_id.short(8),
                        count = artifacts.len(),
                        "artifacts collected"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(
                        job_id = %job_id.short(8),
                        error = %err,
                        "artifact collection failed"
                    );
                }
            }
            match spawn_children(store, ids, &completed) {
                Ok(0) => {}
                Ok(count) => {
                    tracing::info!(
                        job_id = %job_id.short(8),
                        count,
                        "spawned child jobs via multiplier"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        job_id = %job_id.short(8),
                        error = %err,
                        "multiplier spawn failed"
                    );
                }
            }
        }
        end => {
            let failure = match end {
                AttemptEnd::Exited(code) => format!("exit_code_{code}"),
                AttemptEnd::TimedOut => "timeout".to_string(),
            };
            if job.can_retry() {
                store.requeue_job_for_retry(job_id, &log)?;
                tracing::warn!(
                    job_id = %job_id.short(8),
                    %failure,
                    attempt = job.attempt(),
                    max_attempts = job.max_retries + 1,
                    "job attempt failed, retrying"
                );
            } else {
                let reason = format!("{failure}_after_{}_attempts", job.attempt());
                store.fail_job(job_id, &reason, Some(&log))?;
                tracing::error!(
                    job_id = %job_id.short(8),
                    %reason,
                    "job failed permanently"
                );
                propagate_failure(store, job_id)?;
            }
        }
    }
    Ok(())
}

/// Spawn the shell subprocess and stream its merged output line by line
/// until exit or timeout. On timeout the child is killed and the attempt
/// counts as a failure.
async fn run_subprocess(
    job_id: &JobId,
    command: &str,
    workspace: &Path,
    timeout: Duration,
) -> Result<(AttemptEnd, String), EngineError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if workspace.is_dir() {
        cmd.current_dir(workspace);
    }
    let mut child = cmd.spawn()?;

    let mut stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
    let mut stderr = child.stderr.take().map(|s| BufReader::new(s).lines());
    let mut log: Vec<String> = Vec::new();

    let attempt = async {
        loop {
            if stdout.is_none() && stderr.is_none() {
                break;
            }
            tokio::select! {
                line = next_line(&mut stdout), if stdout.is_some() => {
                    if let Some(line) = line {
                        tracing::debug!(job_id = %job_id.short(8), "{}", line);
                        log.push(line);
                    }
                }
                line = next_line(&mut stderr), if stderr.is_some() => {
                    if let Some(line) = line {
                        tracing::debug!(job_id = %job_id.short(8), "{}", line);
                        log.push(line);
                    }
                }
            }
        }
        child.wait().await
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(status) => {
            let status = status?;
            Ok((AttemptEnd::Exited(status.code().unwrap_or(-1)), log.join("\n")))
        }
        Err(_elapsed) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            tracing::warn!(
                job_id = %job_id.short(8),
                timeout_secs = timeout.as_secs(),
                "job attempt timed out, subprocess killed"
            );
            Ok((AttemptEnd::TimedOut, log.join("\n")))
        }
    }
}

/// Read the next line from an optional stream, closing it on EOF or error.
async fn next_line<R: AsyncBufRead + Unpin>(reader: &mut Option<Lines<R>>) -> Option<String> {
    match reader {
        Some(lines) => match lines.next_line().await {
            Ok(Some(line)) => Some(line),
            Ok(None) | Err(_) => {
                *reader = None;
                None
            }
        },
        None => None,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
