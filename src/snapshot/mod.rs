//! Habit Snapshots
//!
//! The analysis core works on immutable, in-memory snapshots of a user's
//! habits and checkins. This module reads them from the formats the habit
//! and checkin services export:
//!
//! - **JSON**: `{ "habits": [...], "checkins": [...] }`
//! - **CSV**: checkin rows, see [`CsvCheckinImporter`]

mod csv_import;
mod error;

pub use csv_import::{CsvCheckinImporter, CsvImportResult};
pub use error::{SnapshotError, SnapshotResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::{Checkin, Habit};

/// A habit roster and its checkin history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub habits: Vec<Habit>,
    #[serde(default)]
    pub checkins: Vec<Checkin>,
}

impl Snapshot {
    pub fn new(habits: Vec<Habit>, checkins: Vec<Checkin>) -> Self {
        Self { habits, checkins }
    }

    /// Load a JSON snapshot from disk
    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&content)?;
        tracing::debug!(
            path = ?path,
            habits = snapshot.habits.len(),
            checkins = snapshot.checkins.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Decode a JSON snapshot
    pub fn from_json_str(json: &str) -> SnapshotResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Append checkins from another source (e.g. a CSV import)
    pub fn extend_checkins(&mut self, checkins: impl IntoIterator<Item = Checkin>) {
        self.checkins.extend(checkins);
    }

    pub fn habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    /// Checkins whose habit is not part of the roster
    pub fn orphaned_checkins(&self) -> usize {
        self.checkins
            .iter()
            .filter(|c| self.habit(&c.habit_id).is_none())
            .count()
    }
}
