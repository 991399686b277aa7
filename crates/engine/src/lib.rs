// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! clowder-engine: pipeline materialization and execution
//!
//! The scheduler polls the store, dispatches ready jobs to subprocess
//! executors, and finalizes pipelines. Everything advances through the
//! periodic tick; completions, multiplier fan-out, and deadlock checks
//! never race each other through event callbacks.

mod collector;
mod error;
mod executor;
mod instantiate;
mod multiplier;
mod propagate;
mod scheduler;
#[cfg(test)]
mod testutil;

pub use collector::{collect_artifacts, WorkspaceSnapshot};
pub use error::EngineError;
pub use executor::run_job;
pub use instantiate::{instantiate, plan_pipeline, InstantiateRequest, DEFAULT_MAX_RETRIES};
pub use multiplier::{parse_items, spawn_children};
pub use propagate::{check_pipeline_completion, propagate_failure};
pub use scheduler::Scheduler;
