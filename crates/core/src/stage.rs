// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage entity.

use crate::pipeline::PipelineId;
use crate::status::StageStatus;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a materialized stage.
    StageId
}

/// An ordered grouping of jobs within a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub pipeline_id: PipelineId,
    pub name: String,
    pub stage_order: i64,
    pub status: StageStatus,
    pub created_at: String,
}
