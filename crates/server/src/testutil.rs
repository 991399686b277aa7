// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for server tests.

use crate::PipelineService;
use clowder_store::Store;
use tempfile::TempDir;

/// Store seeded with the shipped templates, wrapped in a service.
pub(crate) fn seeded_service() -> (TempDir, Store, PipelineService) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path().join("clowder.db")).unwrap();
    store.init_schema().unwrap();
    store.seed_templates_if_empty().unwrap();
    let service = PipelineService::new(store.clone());
    (dir, store, service)
}
