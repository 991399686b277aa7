// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable timestamps

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time. All persisted timestamps are UTC ISO-8601.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// ISO-8601 timestamp string (microsecond precision, `Z` suffix).
    fn timestamp(&self) -> String {
        self.now_utc().to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Wall-clock time for production use
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually-advanced clock for tests
#[derive(Clone)]
pub struct FakeClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    /// Starts at a fixed epoch so test timestamps are reproducible.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default())),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += Duration::seconds(secs);
    }

    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock();
        *now += Duration::milliseconds(millis);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
