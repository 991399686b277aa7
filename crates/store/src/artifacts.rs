// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact and action-history persistence.

use crate::rows::{artifact_from_row, parse_json_opt};
use crate::{Store, StoreError};
use clowder_core::{ActionRecord, Artifact, JobId, NewArtifact};
use rusqlite::{params, OptionalExtension};

const ARTIFACT_COLUMNS: &str = "artifact_id, job_id, type, name, description, file_path, \
     content, content_hash, size_bytes, metadata, created_at";

impl Store {
    /// Persist a batch of artifacts in one transaction.
    pub fn insert_artifacts(&self, artifacts: &[NewArtifact]) -> Result<(), StoreError> {
        if artifacts.is_empty() {
            return Ok(());
        }
        let now = self.timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        for artifact in artifacts {
            tx.execute(
                "INSERT INTO artifacts (
                     artifact_id, job_id, type, name, description, file_path, content,
                     content_hash, size_bytes, metadata, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    artifact.id.as_str(),
                    artifact.job_id.as_str(),
                    artifact.kind,
                    artifact.name,
                    artifact.description,
                    artifact.file_path,
                    artifact.content,
                    artifact.content_hash,
                    artifact.size_bytes,
                    artifact.metadata.as_ref().map(|v| v.to_string()),
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn artifacts_for_job(&self, job_id: &JobId) -> Result<Vec<Artifact>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE job_id = ?1
             ORDER BY created_at, rowid"
        ))?;
        let artifacts = stmt
            .query_map(params![job_id.as_str()], artifact_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artifacts)
    }

    /// Inline content of the most recent artifact with the given name.
    pub fn artifact_content(
        &self,
        job_id: &JobId,
        name: &str,
    ) -> Result<Option<String>, StoreError> {
        let conn = self.lock();
        let content = conn
            .query_row(
                "SELECT content FROM artifacts WHERE job_id = ?1 AND name = ?2
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![job_id.as_str(), name],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(content)
    }

    /// Append one iteration record. Agent subprocesses sharing the database
    /// write these; the orchestrator reads them for multiplier fan-out.
    pub fn append_action(&self, record: &ActionRecord) -> Result<(), StoreError> {
        self.lock().execute(
            "INSERT INTO action_history (
                 job_id, iteration, timestamp, llm_response, results, raw_stdout, raw_stderr
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.job_id.as_str(),
                record.iteration,
                record.timestamp,
                record.llm_response.to_string(),
                record.results.to_string(),
                record.raw_stdout,
                record.raw_stderr
            ],
        )?;
        Ok(())
    }

    /// The most recent iteration record for a job, if any.
    pub fn last_action(&self, job_id: &JobId) -> Result<Option<ActionRecord>, StoreError> {
        let conn = self.lock();
        let record = conn
            .query_row(
                "SELECT job_id, iteration, timestamp, llm_response, results, raw_stdout,
                        raw_stderr
                 FROM action_history WHERE job_id = ?1
                 ORDER BY iteration DESC LIMIT 1",
                params![job_id.as_str()],
                |row| {
                    Ok(ActionRecord {
                        job_id: JobId::new(row.get::<_, String>(0)?),
                        iteration: row.get(1)?,
                        timestamp: row.get(2)?,
                        llm_response: parse_json_opt(Some(row.get(3)?))?
                            .unwrap_or(serde_json::Value::Null),
                        results: parse_json_opt(Some(row.get(4)?))?
                            .unwrap_or(serde_json::Value::Null),
                        raw_stdout: row.get(5)?,
                        raw_stderr: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;
