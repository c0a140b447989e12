//! Snapshot loading errors

use thiserror::Error;

/// Errors that can occur while reading habit/checkin snapshots
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON snapshot could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A single record could not be interpreted
    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Result type alias for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SnapshotError::InvalidRecord {
            line: 4,
            reason: "missing date".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid record at line 4: missing date");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SnapshotError = io_err.into();
        assert!(matches!(err, SnapshotError::Io(_)));
    }
}
