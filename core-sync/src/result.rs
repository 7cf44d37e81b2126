//! Outcome of one sync invocation

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Counts for one sync run. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// New photos written to the catalog
    pub imported: usize,
    /// Candidates already cataloged; never fetched
    pub skipped: usize,
    /// One `"Failed to import <key>: <message>"` line per failed object
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn record_failure(&mut self, key: &str, error: impl Display) {
        self.errors.push(format!("Failed to import {}: {}", key, error));
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    /// Candidates looked at, whatever happened to them.
    pub fn processed(&self) -> usize {
        self.imported + self.skipped + self.failed()
    }
}
