// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact collectors: after a job succeeds, the orchestrator (never the
//! model) decides what the job produced and persists it.

use crate::EngineError;
use clowder_core::artifact::ArtifactId;
use clowder_core::{
    ArtifactStrategyConfig, IdGen, Job, NewArtifact, ARTIFACT_FILE, ARTIFACT_MODEL_OUTPUT,
    FINAL_OUTPUT_NAME,
};
use clowder_store::Store;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Content snapshot of a workspace tree, taken before a job's subprocess
/// starts. `.git` trees are ignored.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    files: HashMap<PathBuf, String>,
}

/// A file that differs from the snapshot.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    pub size_bytes: u64,
    pub content_hash: String,
}

impl WorkspaceSnapshot {
    /// Hash every regular file under `root`.
    pub fn capture(root: &Path) -> Result<Self, EngineError> {
        let mut files = HashMap::new();
        for (relative, absolute) in walk_files(root)? {
            let bytes = std::fs::read(&absolute)?;
            files.insert(relative, hex_digest(&bytes));
        }
        Ok(Self { files })
    }

    /// Files added or modified since capture. Deleted files produce no
    /// artifact; there is nothing left to reference.
    pub fn changed_files(&self, root: &Path) -> Result<Vec<ChangedFile>, EngineError> {
        let mut changed = Vec::new();
        for (relative, absolute) in walk_files(root)? {
            let bytes = std::fs::read(&absolute)?;
            let hash = hex_digest(&bytes);
            if self.files.get(&relative).map(String::as_str) != Some(hash.as_str()) {
                changed.push(ChangedFile {
                    relative_path: relative,
                    absolute_path: absolute,
                    size_bytes: bytes.len() as u64,
                    content_hash: hash,
                });
            }
        }
        changed.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(changed)
    }
}

fn walk_files(root: &Path) -> Result<Vec<(PathBuf, PathBuf)>, EngineError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                if entry.file_name() != ".git" {
                    pending.push(path);
                }
            } else if file_type.is_file() {
                if let Ok(relative) = path.strip_prefix(root) {
                    files.push((relative.to_path_buf(), path.clone()));
                }
            }
        }
    }
    Ok(files)
}

fn hex_digest(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Run the job's artifact strategy and persist everything it captured in
/// one transaction. Returns what was persisted. Never touches job status.
pub fn collect_artifacts(
    store: &Store,
    ids: &impl IdGen,
    job: &Job,
    workspace: &Path,
    snapshot: Option<&WorkspaceSnapshot>,
    final_output: &str,
) -> Result<Vec<NewArtifact>, EngineError> {
    let config = ArtifactStrategyConfig::resolve(job.artifact_strategy.as_ref());
    let mut artifacts = Vec::new();
    collect_into(&config, ids, job, workspace, snapshot, final_output, &mut artifacts)?;
    store.insert_artifacts(&artifacts)?;
    Ok(artifacts)
}

fn collect_into(
    config: &ArtifactStrategyConfig,
    ids: &impl IdGen,
    job: &Job,
    workspace: &Path,
    snapshot: Option<&WorkspaceSnapshot>,
    final_output: &str,
    artifacts: &mut Vec<NewArtifact>,
) -> Result<(), EngineError> {
    match config {
        ArtifactStrategyConfig::StdoutFinal => {
            if !final_output.is_empty() {
                artifacts.push(NewArtifact {
                    id: ArtifactId::new(ids.next()),
                    job_id: job.id.clone(),
                    kind: ARTIFACT_MODEL_OUTPUT.to_string(),
                    name: FINAL_OUTPUT_NAME.to_string(),
                    description: "Final model output before job completion".to_string(),
                    file_path: None,
                    content: Some(final_output.to_string()),
                    content_hash: None,
                    size_bytes: final_output.len() as u64,
                    metadata: Some(json!({"strategy": "stdout_final"})),
                });
            }
        }
        ArtifactStrategyConfig::WorkspaceDelta => {
            let Some(snapshot) = snapshot else {
                tracing::warn!(
                    job_id = %job.id.short(8),
                    "workspace_delta configured but no snapshot was taken, skipping"
                );
                return Ok(());
            };
            for changed in snapshot.changed_files(workspace)? {
                artifacts.push(NewArtifact {
                    id: ArtifactId::new(ids.next()),
                    job_id: job.id.clone(),
                    kind: ARTIFACT_FILE.to_string(),
                    name: changed.relative_path.display().to_string(),
                    description: "File modified or created by job".to_string(),
                    file_path: Some(changed.absolute_path.display().to_string()),
                    content: None,
                    content_hash: Some(changed.content_hash),
                    size_bytes: changed.size_bytes,
                    metadata: Some(json!({
                        "strategy": "workspace_delta",
                        "relative_path": changed.relative_path.display().to_string(),
                    })),
                });
            }
        }
        ArtifactStrategyConfig::Composite { strategies } => {
            for nested in strategies {
                collect_into(nested, ids, job, workspace, snapshot, final_output, artifacts)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "collector_tests.rs"]
mod tests;
