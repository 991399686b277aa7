// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store handle and connection setup.

use crate::StoreError;
use clowder_core::{Clock, SystemClock};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// SQL bootstrap replayed on every start (idempotent).
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Seed templates, replayed only when no templates exist.
const SEEDS_SQL: &str = include_str!("seeds.sql");

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed access to the relational state: templates, pipelines, stages,
/// jobs, dependencies, artifacts, and action history.
///
/// One embedded database file in WAL mode behind a mutex; the handle is
/// cheap to clone and safe to share across the scheduler, executors, and
/// HTTP handlers. Multi-row writes always run in a single transaction.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open (or create) the database file with production settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Open with an explicit clock so tests control row timestamps.
    pub fn open_with_clock(
        path: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    /// Replay the schema bootstrap. Safe to call on every start.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.lock().execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Replay seed templates when the template table is empty.
    /// Returns whether seeds were loaded.
    pub fn seed_templates_if_empty(&self) -> Result<bool, StoreError> {
        let conn = self.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM pipeline_templates", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(false);
        }
        conn.execute_batch(SEEDS_SQL)?;
        tracing::info!("seed templates loaded");
        Ok(true)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    pub(crate) fn timestamp(&self) -> String {
        self.clock.timestamp()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
