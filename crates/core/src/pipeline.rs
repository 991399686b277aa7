// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline entity.

use crate::status::PipelineStatus;
use crate::template::TemplateId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a pipeline instance.
    PipelineId
}

/// Maximum characters of the original prompt used as a display name.
pub const DISPLAY_NAME_LEN: usize = 50;

/// A running or completed instance of a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub template_id: Option<TemplateId>,
    pub original_prompt: String,
    pub workspace_path: String,
    pub status: PipelineStatus,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

impl Pipeline {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Prompt truncated for display in list endpoints. Char-aware so
    /// multi-byte prompts never split inside a code point.
    pub fn display_name(&self) -> String {
        self.original_prompt.chars().take(DISPLAY_NAME_LEN).collect()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
