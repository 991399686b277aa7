// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action history: iteration-level records written by agent subprocesses
//! that keep per-iteration state in the shared database.

use crate::job::JobId;
use serde::{Deserialize, Serialize};

/// One iteration of an agent's tool loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub job_id: JobId,
    pub iteration: u32,
    pub timestamp: String,
    /// Validated model output for the iteration.
    pub llm_response: serde_json::Value,
    /// Tool results for the iteration.
    pub results: serde_json::Value,
    pub raw_stdout: String,
    pub raw_stderr: String,
}

impl ActionRecord {
    /// Arguments of the `finish` action in this record's response, if the
    /// model emitted one. The multiplier reads fan-out items from here.
    pub fn finish_args(&self) -> Option<&serde_json::Value> {
        self.llm_response
            .get("actions")?
            .as_array()?
            .iter()
            .find(|action| action.get("tool").and_then(|t| t.as_str()) == Some("finish"))
            .and_then(|action| action.get("args"))
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
