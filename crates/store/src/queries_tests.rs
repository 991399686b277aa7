// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::testutil::{open_store, running_plan, simple_plan};
use clowder_core::{DependencyType, JobId, PipelineId, TemplateJobId};

#[test]
fn job_without_deps_is_ready_once_pipeline_runs() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["a"], &[]);
    store.insert_plan(&plan).unwrap();

    // Pipeline still pending: nothing dispatches.
    assert!(store.ready_job().unwrap().is_none());

    store.mark_pipeline_running(&plan.pipeline.id).unwrap();
    let ready = store.ready_job().unwrap().unwrap();
    assert_eq!(ready.id, "a");
}

#[test]
fn success_edge_gates_until_completion() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["a", "b"], &[("b", "a", DependencyType::Success)]);
    running_plan(&store, &plan);

    let ready = store.ready_job().unwrap().unwrap();
    assert_eq!(ready.id, "a");

    store.mark_job_running(&JobId::new("a")).unwrap();
    assert!(store.ready_job().unwrap().is_none());

    store.complete_job(&JobId::new("a"), "out").unwrap();
    let ready = store.ready_job().unwrap().unwrap();
    assert_eq!(ready.id, "b");
}

#[yare::parameterized(
    failure_runs_on_failed     = { DependencyType::Failure, false, true },
    failure_blocked_on_success = { DependencyType::Failure, true, false },
    always_runs_on_success     = { DependencyType::Always, true, true },
    always_runs_on_failed      = { DependencyType::Always, false, true },
)]
fn edge_semantics(edge: DependencyType, parent_succeeds: bool, dependent_ready: bool) {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["a", "b"], &[("b", "a", edge)]);
    running_plan(&store, &plan);
    store.mark_job_running(&JobId::new("a")).unwrap();
    if parent_succeeds {
        store.complete_job(&JobId::new("a"), "out").unwrap();
    } else {
        store.fail_job(&JobId::new("a"), "exit_code_1_after_1_attempts", None).unwrap();
    }

    let ready = store.ready_job().unwrap();
    assert_eq!(ready.map(|j| j.id == "b").unwrap_or(false), dependent_ready);
}

#[test]
fn cancelled_pipelines_are_starved() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["a"], &[]);
    running_plan(&store, &plan);
    store.cancel_pipeline(&plan.pipeline.id).unwrap();

    assert!(store.ready_job().unwrap().is_none());
}

#[test]
fn tie_break_prefers_oldest_pipeline() {
    let (_dir, store, clock) = open_store();
    let first = simple_plan("pipe-old", &["old-job"], &[]);
    running_plan(&store, &first);
    clock.advance_secs(1);
    let second = simple_plan("pipe-new", &["new-job"], &[]);
    running_plan(&store, &second);

    let ready = store.ready_job().unwrap().unwrap();
    assert_eq!(ready.id, "old-job");
}

#[test]
fn tie_break_prefers_insertion_order_within_stage() {
    let (_dir, store, _clock) = open_store();
    // All rows share one FakeClock instant; rowid settles the order.
    let plan = simple_plan("pipe-1", &["a", "b", "c"], &[]);
    running_plan(&store, &plan);

    let ready = store.ready_job().unwrap().unwrap();
    assert_eq!(ready.id, "a");
}

#[test]
fn deadlock_requires_a_blocking_edge() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan(
        "pipe-1",
        &["a", "b", "c"],
        &[
            ("b", "a", DependencyType::Success),
            ("c", "a", DependencyType::Failure),
        ],
    );
    running_plan(&store, &plan);

    // Everything still in motion: no deadlock.
    assert!(store
        .pending_jobs_with_blocking_deps(&plan.pipeline.id)
        .unwrap()
        .is_empty());

    store.mark_job_running(&JobId::new("a")).unwrap();
    store.complete_job(&JobId::new("a"), "out").unwrap();

    // The failure edge can never fire now; b is fine, c is stuck.
    let deadlocked = store
        .pending_jobs_with_blocking_deps(&plan.pipeline.id)
        .unwrap();
    assert_eq!(deadlocked, vec![JobId::new("c")]);
}

#[test]
fn skipped_source_blocks_always_edges() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan(
        "pipe-1",
        &["a", "b", "c"],
        &[
            ("b", "a", DependencyType::Success),
            ("c", "b", DependencyType::Always),
        ],
    );
    running_plan(&store, &plan);
    store.mark_job_running(&JobId::new("a")).unwrap();
    store.fail_job(&JobId::new("a"), "exit_code_1_after_1_attempts", None).unwrap();
    store.skip_jobs(&[JobId::new("b")], "dependency_failed").unwrap();

    let deadlocked = store
        .pending_jobs_with_blocking_deps(&plan.pipeline.id)
        .unwrap();
    assert_eq!(deadlocked, vec![JobId::new("c")]);
}

#[test]
fn job_without_edges_never_deadlocks() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["a"], &[]);
    running_plan(&store, &plan);

    assert!(store
        .pending_jobs_with_blocking_deps(&plan.pipeline.id)
        .unwrap()
        .is_empty());
}

#[test]
fn job_counts_tally_statuses() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["a", "b", "c", "d"], &[]);
    running_plan(&store, &plan);
    store.mark_job_running(&JobId::new("a")).unwrap();
    store.complete_job(&JobId::new("a"), "out").unwrap();
    store.mark_job_running(&JobId::new("b")).unwrap();
    store.fail_job(&JobId::new("b"), "exit_code_1_after_1_attempts", None).unwrap();
    store.skip_jobs(&[JobId::new("c")], "dependency_failed").unwrap();

    let counts = store.job_counts(&plan.pipeline.id).unwrap();
    assert_eq!(counts.total, 4);
    assert_eq!(counts.done, 3);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.skipped, 1);
    assert_eq!(counts.pending, 1);
    assert!(!counts.all_done());
}

#[test]
fn children_spawned_guard() {
    let (_dir, store, _clock) = open_store();
    let plan = simple_plan("pipe-1", &["parent"], &[]);
    running_plan(&store, &plan);

    let parent = JobId::new("parent");
    let template_job = TemplateJobId::new("tj-child");
    assert!(!store.children_spawned(&parent, &template_job).unwrap());

    let mut child = crate::testutil::new_job("child-0", "pipe-1", "pipe-1-s1");
    child.parent_job_id = Some(parent.clone());
    child.template_job_id = Some(template_job.clone());
    store.insert_jobs_with_deps(&[child], &[]).unwrap();

    assert!(store.children_spawned(&parent, &template_job).unwrap());
    assert!(!store
        .children_spawned(&parent, &TemplateJobId::new("tj-other"))
        .unwrap());
}

#[test]
fn ready_job_ignores_other_pipelines_jobs() {
    let (_dir, store, clock) = open_store();
    let running = simple_plan("pipe-run", &["r"], &[]);
    running_plan(&store, &running);
    clock.advance_secs(1);
    let pending = simple_plan("pipe-pend", &["p"], &[]);
    store.insert_plan(&pending).unwrap();

    let ready = store.ready_job().unwrap().unwrap();
    assert_eq!(ready.id, "r");
    assert_eq!(ready.pipeline_id, PipelineId::new("pipe-run"));
}
