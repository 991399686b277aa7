// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::testutil::{insert_running, open_store, shell_job, shell_plan};
use clowder_core::{JobId, SequentialIdGen, ARTIFACT_FILE, ARTIFACT_MODEL_OUTPUT};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn job_with_strategy(store: &clowder_store::Store, strategy: Option<serde_json::Value>) -> clowder_core::Job {
    let mut job = shell_job("a", "pipe-1", "pipe-1-s1", "echo done");
    job.artifact_strategy = strategy;
    let plan = shell_plan("pipe-1", "/workspace", vec![job], &[]);
    insert_running(store, &plan);
    store.get_job(&JobId::new("a")).unwrap()
}

#[test]
fn snapshot_detects_added_and_modified_files() {
    let workspace = TempDir::new().unwrap();
    fs::write(workspace.path().join("unchanged.txt"), "same").unwrap();
    fs::write(workspace.path().join("modified.txt"), "before").unwrap();
    fs::create_dir(workspace.path().join(".git")).unwrap();
    fs::write(workspace.path().join(".git").join("HEAD"), "ref").unwrap();

    let snapshot = WorkspaceSnapshot::capture(workspace.path()).unwrap();

    fs::write(workspace.path().join("modified.txt"), "after").unwrap();
    fs::create_dir(workspace.path().join("sub")).unwrap();
    fs::write(workspace.path().join("sub").join("added.txt"), "new").unwrap();
    fs::write(workspace.path().join(".git").join("HEAD"), "other").unwrap();

    let changed = snapshot.changed_files(workspace.path()).unwrap();
    let names: Vec<String> = changed
        .iter()
        .map(|c| c.relative_path.display().to_string())
        .collect();
    assert_eq!(names, vec!["modified.txt".to_string(), "sub/added.txt".to_string()]);
    assert!(changed.iter().all(|c| c.size_bytes > 0));
}

#[test]
fn unchanged_tree_yields_no_delta() {
    let workspace = TempDir::new().unwrap();
    fs::write(workspace.path().join("file.txt"), "content").unwrap();
    let snapshot = WorkspaceSnapshot::capture(workspace.path()).unwrap();
    assert!(snapshot.changed_files(workspace.path()).unwrap().is_empty());
}

#[test]
fn stdout_final_persists_one_inline_artifact() {
    let (_dir, store) = open_store();
    let job = job_with_strategy(&store, Some(json!({"type": "stdout_final"})));
    let ids = SequentialIdGen::new("art");
    let workspace = TempDir::new().unwrap();

    let artifacts =
        collect_artifacts(&store, &ids, &job, workspace.path(), None, "final text").unwrap();
    assert_eq!(artifacts.len(), 1);

    let stored = store.artifacts_for_job(&job.id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].kind, ARTIFACT_MODEL_OUTPUT);
    assert_eq!(stored[0].name, "final_output.txt");
    assert_eq!(stored[0].content.as_deref(), Some("final text"));
    assert_eq!(stored[0].size_bytes, 10);
}

#[test]
fn empty_output_produces_no_artifact() {
    let (_dir, store) = open_store();
    let job = job_with_strategy(&store, None);
    let ids = SequentialIdGen::new("art");
    let workspace = TempDir::new().unwrap();

    let artifacts = collect_artifacts(&store, &ids, &job, workspace.path(), None, "").unwrap();
    assert!(artifacts.is_empty());
}

#[test]
fn missing_config_falls_back_to_stdout_final() {
    let (_dir, store) = open_store();
    let job = job_with_strategy(&store, None);
    let ids = SequentialIdGen::new("art");
    let workspace = TempDir::new().unwrap();

    let artifacts = collect_artifacts(&store, &ids, &job, workspace.path(), None, "out").unwrap();
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "final_output.txt");
}

#[test]
fn workspace_delta_records_file_references() {
    let (_dir, store) = open_store();
    let job = job_with_strategy(&store, Some(json!({"type": "workspace_delta"})));
    let ids = SequentialIdGen::new("art");
    let workspace = TempDir::new().unwrap();

    let snapshot = WorkspaceSnapshot::capture(workspace.path()).unwrap();
    fs::write(workspace.path().join("report.md"), "# done").unwrap();

    let artifacts = collect_artifacts(
        &store,
        &ids,
        &job,
        workspace.path(),
        Some(&snapshot),
        "ignored output",
    )
    .unwrap();
    assert_eq!(artifacts.len(), 1);

    let stored = store.artifacts_for_job(&job.id).unwrap();
    assert_eq!(stored[0].kind, ARTIFACT_FILE);
    assert_eq!(stored[0].name, "report.md");
    assert!(stored[0]
        .file_path
        .as_deref()
        .is_some_and(|p| p.ends_with("report.md")));
    assert!(stored[0].content.is_none());
    assert!(stored[0].content_hash.is_some());
}

#[test]
fn workspace_delta_without_snapshot_collects_nothing() {
    let (_dir, store) = open_store();
    let job = job_with_strategy(&store, Some(json!({"type": "workspace_delta"})));
    let ids = SequentialIdGen::new("art");
    let workspace = TempDir::new().unwrap();
    fs::write(workspace.path().join("file.txt"), "data").unwrap();

    let artifacts =
        collect_artifacts(&store, &ids, &job, workspace.path(), None, "out").unwrap();
    assert!(artifacts.is_empty());
}

#[test]
fn composite_unions_nested_strategies() {
    let (_dir, store) = open_store();
    let job = job_with_strategy(
        &store,
        Some(json!({
            "type": "composite",
            "strategies": [{"type": "stdout_final"}, {"type": "workspace_delta"}],
        })),
    );
    let ids = SequentialIdGen::new("art");
    let workspace = TempDir::new().unwrap();

    let snapshot = WorkspaceSnapshot::capture(workspace.path()).unwrap();
    fs::write(workspace.path().join("new.txt"), "fresh").unwrap();

    let artifacts = collect_artifacts(
        &store,
        &ids,
        &job,
        workspace.path(),
        Some(&snapshot),
        "the output",
    )
    .unwrap();
    assert_eq!(artifacts.len(), 2);

    let kinds: Vec<&str> = artifacts.iter().map(|a| a.kind.as_str()).collect();
    assert!(kinds.contains(&ARTIFACT_MODEL_OUTPUT));
    assert!(kinds.contains(&ARTIFACT_FILE));
}
