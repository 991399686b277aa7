// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testutil::{insert_running, open_store, shell_job, shell_plan};
use clowder_core::{DependencyType, JobId, JobStatus, PipelineStatus};
use clowder_store::Store;

fn fail(store: &Store, id: &str) {
    store.mark_job_running(&JobId::new(id)).unwrap();
    store
        .fail_job(&JobId::new(id), "exit_code_1_after_1_attempts", None)
        .unwrap();
}

fn complete(store: &Store, id: &str) {
    store.mark_job_running(&JobId::new(id)).unwrap();
    store.complete_job(&JobId::new(id), "out").unwrap();
}

#[test]
fn skip_cascades_through_success_chains() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b", "c"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan(
        "pipe-1",
        "/workspace",
        jobs,
        &[
            ("b", "a", DependencyType::Success),
            ("c", "b", DependencyType::Success),
        ],
    );
    insert_running(&store, &plan);
    fail(&store, "a");

    let skipped = propagate_failure(&store, &JobId::new("a")).unwrap();
    assert_eq!(skipped, 2);

    for id in ["b", "c"] {
        let job = store.get_job(&JobId::new(id)).unwrap();
        assert_eq!(job.status, JobStatus::Skipped);
        assert_eq!(job.termination_reason.as_deref(), Some("dependency_failed"));
        assert!(job.completed_at.is_some());
    }
}

#[test]
fn failure_and_always_edges_do_not_skip() {
    let (_dir, store) = open_store();
    let jobs = ["a", "on-fail", "on-always"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan(
        "pipe-1",
        "/workspace",
        jobs,
        &[
            ("on-fail", "a", DependencyType::Failure),
            ("on-always", "a", DependencyType::Always),
        ],
    );
    insert_running(&store, &plan);
    fail(&store, "a");

    assert_eq!(propagate_failure(&store, &JobId::new("a")).unwrap(), 0);
    assert_eq!(
        store.get_job(&JobId::new("on-fail")).unwrap().status,
        JobStatus::Pending
    );
    assert_eq!(
        store.get_job(&JobId::new("on-always")).unwrap().status,
        JobStatus::Pending
    );
}

#[test]
fn propagation_is_idempotent() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan("pipe-1", "/workspace", jobs, &[("b", "a", DependencyType::Success)]);
    insert_running(&store, &plan);
    fail(&store, "a");

    assert_eq!(propagate_failure(&store, &JobId::new("a")).unwrap(), 1);
    assert_eq!(propagate_failure(&store, &JobId::new("a")).unwrap(), 0);
    assert_eq!(
        store.get_job(&JobId::new("b")).unwrap().status,
        JobStatus::Skipped
    );
}

#[test]
fn running_dependents_are_left_alone() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan("pipe-1", "/workspace", jobs, &[("b", "a", DependencyType::Success)]);
    insert_running(&store, &plan);
    store.mark_job_running(&JobId::new("b")).unwrap();
    fail(&store, "a");

    assert_eq!(propagate_failure(&store, &JobId::new("a")).unwrap(), 0);
    assert_eq!(
        store.get_job(&JobId::new("b")).unwrap().status,
        JobStatus::Running
    );
}

#[test]
fn all_completed_finalizes_as_completed() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan("pipe-1", "/workspace", jobs, &[]);
    insert_running(&store, &plan);
    complete(&store, "a");
    complete(&store, "b");

    check_pipeline_completion(&store, &plan.pipeline.id).unwrap();
    let pipeline = store.get_pipeline(&plan.pipeline.id).unwrap();
    assert_eq!(pipeline.status, PipelineStatus::Completed);
    assert!(pipeline.completed_at.is_some());
}

#[test]
fn one_failed_job_fails_the_pipeline() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan("pipe-1", "/workspace", jobs, &[]);
    insert_running(&store, &plan);
    complete(&store, "a");
    fail(&store, "b");

    check_pipeline_completion(&store, &plan.pipeline.id).unwrap();
    assert_eq!(
        store.get_pipeline(&plan.pipeline.id).unwrap().status,
        PipelineStatus::Failed
    );
}

#[test]
fn skipped_jobs_alone_do_not_fail_the_pipeline() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan("pipe-1", "/workspace", jobs, &[]);
    insert_running(&store, &plan);
    complete(&store, "a");
    store.skip_jobs(&[JobId::new("b")], "dependency_failed").unwrap();

    check_pipeline_completion(&store, &plan.pipeline.id).unwrap();
    assert_eq!(
        store.get_pipeline(&plan.pipeline.id).unwrap().status,
        PipelineStatus::Completed
    );
}

#[test]
fn unfinished_pipeline_is_left_running() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan("pipe-1", "/workspace", jobs, &[("b", "a", DependencyType::Success)]);
    insert_running(&store, &plan);
    complete(&store, "a");

    check_pipeline_completion(&store, &plan.pipeline.id).unwrap();
    assert_eq!(
        store.get_pipeline(&plan.pipeline.id).unwrap().status,
        PipelineStatus::Running
    );
}

#[test]
fn deadlock_fails_pipeline_and_skips_stuck_jobs() {
    let (_dir, store) = open_store();
    let jobs = ["a", "b", "c"]
        .iter()
        .map(|id| shell_job(id, "pipe-1", "pipe-1-s1", "echo done"))
        .collect();
    let plan = shell_plan(
        "pipe-1",
        "/workspace",
        jobs,
        &[
            ("b", "a", DependencyType::Success),
            ("c", "a", DependencyType::Failure),
        ],
    );
    insert_running(&store, &plan);
    complete(&store, "a");
    complete(&store, "b");

    check_pipeline_completion(&store, &plan.pipeline.id).unwrap();

    let pipeline = store.get_pipeline(&plan.pipeline.id).unwrap();
    assert_eq!(pipeline.status, PipelineStatus::Failed);

    let c = store.get_job(&JobId::new("c")).unwrap();
    assert_eq!(c.status, JobStatus::Skipped);
    assert_eq!(c.termination_reason.as_deref(), Some("pipeline_deadlocked"));
}
