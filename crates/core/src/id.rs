// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes and generation.
//!
//! Every entity row carries an opaque string id. [`define_id!`] stamps out
//! one newtype per table; fresh ids are drawn through [`IdGen`] so the
//! instantiator, executor, and multiplier use UUIDs in production and a
//! readable sequence in tests.

use parking_lot::Mutex;
use std::sync::Arc;

/// Define an opaque string identifier for one entity table.
///
/// The generated type converts from borrowed and owned strings, compares
/// against string literals in assertions, and truncates for log lines via
/// `short()`.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Prefix of at most `n` characters, never splitting a code
            /// point. Log lines use `short(8)` the way the original UUIDs
            /// were abbreviated.
            pub fn short(&self, n: usize) -> &str {
                match self.0.char_indices().nth(n) {
                    Some((end, _)) => &self.0[..end],
                    None => &self.0,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

/// Source of fresh row identifiers.
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> String;
}

/// Random v4 UUIDs for production use.
#[derive(Clone, Copy, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Prefixed counter for tests. Shared across clones so one fixture hands
/// out `prefix-1`, `prefix-2`, ... no matter which handle draws.
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    issued: Arc<Mutex<u64>>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            issued: Arc::new(Mutex::new(0)),
        }
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> String {
        let mut issued = self.issued.lock();
        *issued += 1;
        format!("{}-{}", self.prefix, issued)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
