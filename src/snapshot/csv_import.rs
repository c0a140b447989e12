//! CSV Checkin Import
//!
//! Reads checkin rows of the form
//! `habitId,date,isCompleted,createdAt[,completionTime]`.
//! Column positions can be remapped or detected from the header row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::io::Read;
use std::path::Path;

use super::error::{SnapshotError, SnapshotResult};
use crate::model::{start_of_day, Checkin};

/// Rows reported individually before the error list is truncated
const MAX_REPORTED_ERRORS: usize = 100;

/// CSV checkin importer with configurable column mapping
#[derive(Debug, Clone)]
pub struct CsvCheckinImporter {
    habit_column: usize,
    date_column: usize,
    completed_column: Option<usize>,
    created_at_column: Option<usize>,
    completion_time_column: Option<usize>,
    has_header: bool,
}

/// Result of a CSV import operation
#[derive(Debug, Default)]
pub struct CsvImportResult {
    pub checkins: Vec<Checkin>,
    pub rows_processed: usize,
    pub rows_failed: usize,
    pub errors: Vec<String>,
}

impl Default for CsvCheckinImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvCheckinImporter {
    /// Importer for the canonical column order
    pub fn new() -> Self {
        Self {
            habit_column: 0,
            date_column: 1,
            completed_column: Some(2),
            created_at_column: Some(3),
            completion_time_column: Some(4),
            has_header: true,
        }
    }

    /// Set the habit id column
    pub fn with_habit_column(mut self, column: usize) -> Self {
        self.habit_column = column;
        self
    }

    /// Set the calendar date column
    pub fn with_date_column(mut self, column: usize) -> Self {
        self.date_column = column;
        self
    }

    /// Set (or clear) the completion flag column; rows without it count as completed
    pub fn with_completed_column(mut self, column: Option<usize>) -> Self {
        self.completed_column = column;
        self
    }

    /// Set (or clear) the recorded-at column; rows without it are stamped at noon
    pub fn with_created_at_column(mut self, column: Option<usize>) -> Self {
        self.created_at_column = column;
        self
    }

    /// Set whether the CSV has a header row
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Detect column mapping from header names
    pub fn auto_detect_columns(&mut self, headers: &csv::StringRecord) {
        self.completed_column = None;
        self.created_at_column = None;
        self.completion_time_column = None;

        for (idx, header) in headers.iter().enumerate() {
            let key: String = header
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase();

            match key.as_str() {
                "habitid" | "habit" => self.habit_column = idx,
                "date" | "day" => self.date_column = idx,
                "iscompleted" | "completed" | "done" => self.completed_column = Some(idx),
                "createdat" | "timestamp" | "recordedat" => self.created_at_column = Some(idx),
                "completiontime" | "time" => self.completion_time_column = Some(idx),
                _ => {}
            }
        }
    }

    /// Import checkins from a CSV file
    pub fn import(&self, path: &Path) -> SnapshotResult<CsvImportResult> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .flexible(true)
            .from_path(path)?;
        Ok(self.read_records(reader))
    }

    /// Import from a CSV string (useful for testing)
    pub fn import_str(&self, csv_data: &str) -> SnapshotResult<CsvImportResult> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .flexible(true)
            .from_reader(csv_data.as_bytes());
        Ok(self.read_records(reader))
    }

    fn read_records<R: Read>(&self, mut reader: csv::Reader<R>) -> CsvImportResult {
        let mut result = CsvImportResult::default();

        for (line_num, record) in reader.records().enumerate() {
            let actual_line = if self.has_header {
                line_num + 2
            } else {
                line_num + 1
            };

            let parsed = record
                .map_err(SnapshotError::from)
                .and_then(|r| self.parse_record(&r, actual_line));

            match parsed {
                Ok(checkin) => {
                    result.checkins.push(checkin);
                    result.rows_processed += 1;
                }
                Err(e) => {
                    tracing::warn!(line = actual_line, error = %e, "Rejected checkin row");
                    result.errors.push(format!("Line {}: {}", actual_line, e));
                    result.rows_failed += 1;
                }
            }
        }

        if result.errors.len() > MAX_REPORTED_ERRORS {
            let total = result.errors.len();
            result.errors.truncate(MAX_REPORTED_ERRORS);
            result
                .errors
                .push(format!("... and {} more errors", total - MAX_REPORTED_ERRORS));
        }

        result
    }

    fn parse_record(&self, record: &csv::StringRecord, line: usize) -> SnapshotResult<Checkin> {
        let invalid = |reason: String| SnapshotError::InvalidRecord { line, reason };
        let field = |col: usize| record.get(col).map(str::trim).filter(|s| !s.is_empty());

        let habit_id = field(self.habit_column)
            .ok_or_else(|| invalid("missing habit id".to_string()))?;
        let date_str = field(self.date_column).ok_or_else(|| invalid("missing date".to_string()))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| invalid(format!("bad date {:?}: {}", date_str, e)))?;

        let is_completed = match self.completed_column.and_then(field) {
            Some(flag) => parse_flag(flag).ok_or_else(|| invalid(format!("bad completion flag {:?}", flag)))?,
            None => true,
        };

        let created_at = match self.created_at_column.and_then(field) {
            Some(ts) => parse_timestamp(ts).ok_or_else(|| invalid(format!("bad timestamp {:?}", ts)))?,
            None => start_of_day(date) + chrono::Duration::hours(12),
        };

        let completion_time = match self.completion_time_column.and_then(field) {
            Some(t) => Some(
                NaiveTime::parse_from_str(t, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                    .map_err(|e| invalid(format!("bad completion time {:?}: {}", t, e)))?,
            ),
            None => None,
        };

        Ok(Checkin {
            habit_id: habit_id.to_string(),
            date,
            is_completed,
            created_at,
            completion_time,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse a recorded-at timestamp: RFC 3339, a naive UTC datetime, or Unix millis
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.and_utc());
        }
    }

    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}
