// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn test_job(id: &str) -> Job {
    Job {
        id: JobId::new(id),
        pipeline_id: PipelineId::new("pipe-1"),
        stage_id: StageId::new("stage-1"),
        agent_type: "worker".to_string(),
        prompt: "do the thing".to_string(),
        original_prompt: "do the thing".to_string(),
        command: None,
        max_iterations: 10,
        timeout_seconds: 600,
        allowed_paths: vec!["/workspace".to_string()],
        artifact_strategy: None,
        retry_strategy: None,
        template_job_id: None,
        parent_job_id: None,
        status: JobStatus::Pending,
        iteration: 0,
        retry_count: 0,
        max_retries: 3,
        termination_reason: None,
        job_output: None,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        updated_at: "2026-01-01T00:00:00Z".to_string(),
        started_at: None,
        completed_at: None,
    }
}

#[test]
fn default_command_references_job_id() {
    let job = test_job("job-42");
    assert_eq!(job.effective_command(), "clowder-agent job-42");
}

#[test]
fn custom_command_is_used_verbatim() {
    let mut job = test_job("job-42");
    job.command = Some("echo done".to_string());
    assert_eq!(job.effective_command(), "echo done");
}

#[test]
fn retry_budget() {
    let mut job = test_job("job-1");
    assert!(job.can_retry());
    assert_eq!(job.attempt(), 1);

    job.retry_count = 3;
    assert!(!job.can_retry());
    assert_eq!(job.attempt(), 4);
}

#[test]
fn terminality_follows_status() {
    let mut job = test_job("job-1");
    assert!(!job.is_terminal());
    job.status = JobStatus::Skipped;
    assert!(job.is_terminal());
}
