// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact entity: a persisted output of a completed job.

use crate::job::JobId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an artifact.
    ArtifactId
}

/// Artifact type for inline model output.
pub const ARTIFACT_MODEL_OUTPUT: &str = "model_output";

/// Artifact type for a workspace file reference.
pub const ARTIFACT_FILE: &str = "file";

/// Artifact name used for a job's captured final output.
pub const FINAL_OUTPUT_NAME: &str = "final_output.txt";

/// A persisted output of a completed job: either inline content or an
/// absolute file reference. Write-once per job attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub job_id: JobId,
    /// Informational type tag (`model_output`, `file`).
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub file_path: Option<String>,
    pub content: Option<String>,
    pub content_hash: Option<String>,
    pub size_bytes: u64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}
