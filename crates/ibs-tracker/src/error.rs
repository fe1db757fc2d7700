//! Error types for ibs-tracker.
//!
//! This module defines all error types used throughout the crate. Errors on
//! the read path of the persisted journal are recovered by the gateway and
//! never reach this enum's callers; write-path and import-path failures are
//! always propagated.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ibs-tracker operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Writing the journal blob to the store failed.
    #[error("failed to save journal under key '{key}': {message}")]
    StorageWrite {
        /// Store key that was being written.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The serialized journal does not fit in the configured store quota.
    #[error("storage quota exceeded: {size} bytes exceeds limit of {limit} bytes")]
    QuotaExceeded {
        /// Size of the blob that was rejected.
        size: usize,
        /// Configured maximum size.
        limit: usize,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Journal Errors ===
    /// An entry field is out of range.
    #[error("invalid entry field '{field}': {message}")]
    InvalidEntry {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the violated constraint.
        message: String,
    },

    /// A calendar date could not be parsed.
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        input: String,
    },

    /// A trend window other than 7, 14 or 30 days was requested.
    #[error("invalid trend window {days}: must be 7, 14 or 30")]
    InvalidWindow {
        /// The rejected number of days.
        days: u32,
    },

    /// An import file could not be decoded into a journal.
    #[error("could not import {source_name}: {message}")]
    ImportParse {
        /// File name (or other label) of the rejected input.
        source_name: String,
        /// What was wrong with it.
        message: String,
    },

    /// There is no earlier entry to copy from.
    #[error("no entry before {date} to copy")]
    NoPreviousEntry {
        /// The target date.
        date: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for ibs-tracker operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a storage write error.
    #[must_use]
    pub fn storage_write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StorageWrite {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an import parse error.
    #[must_use]
    pub fn import_parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ImportParse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid entry error.
    #[must_use]
    pub fn invalid_entry(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            field,
            message: message.into(),
        }
    }

    /// Check if this error came from persisting the journal.
    #[must_use]
    pub fn is_write_error(&self) -> bool {
        matches!(
            self,
            Self::StorageWrite { .. } | Self::QuotaExceeded { .. }
        )
    }

    /// Check if this error came from a rejected import.
    #[must_use]
    pub fn is_import_error(&self) -> bool {
        matches!(self, Self::ImportParse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::storage_write("ibs-tracker-data", "disk full");
        assert_eq!(
            err.to_string(),
            "failed to save journal under key 'ibs-tracker-data': disk full"
        );

        let err = Error::InvalidWindow { days: 9 };
        assert_eq!(err.to_string(), "invalid trend window 9: must be 7, 14 or 30");
    }

    #[test]
    fn test_is_write_error() {
        assert!(Error::storage_write("k", "boom").is_write_error());
        assert!(Error::QuotaExceeded { size: 10, limit: 5 }.is_write_error());
        assert!(!Error::import_parse("x.json", "bad").is_write_error());
    }

    #[test]
    fn test_is_import_error() {
        let err = Error::import_parse("backup.json", "expected value at line 1");
        assert!(err.is_import_error());
        assert!(!Error::InvalidWindow { days: 3 }.is_import_error());
    }

    #[test]
    fn test_import_parse_display() {
        let err = Error::import_parse("backup.json", "missing field `entries`");
        let msg = err.to_string();
        assert!(msg.contains("backup.json"));
        assert!(msg.contains("missing field"));
    }

    #[test]
    fn test_invalid_entry_display() {
        let err = Error::invalid_entry("mood", "must be between 1 and 5, got 9");
        let msg = err.to_string();
        assert!(msg.contains("mood"));
        assert!(msg.contains("got 9"));
    }

    #[test]
    fn test_quota_exceeded_display() {
        let err = Error::QuotaExceeded {
            size: 2048,
            limit: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn test_invalid_date_display() {
        let err = Error::InvalidDate {
            input: "2024-13-01".to_string(),
        };
        assert!(err.to_string().contains("2024-13-01"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_no_previous_entry_display() {
        let err = Error::NoPreviousEntry {
            date: "2024-01-01".to_string(),
        };
        assert_eq!(err.to_string(), "no entry before 2024-01-01 to copy");
    }
}
