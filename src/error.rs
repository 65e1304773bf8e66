//! Error types for cavemon.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=storage, 3=not_found, 4=validation, etc.)
//! - Retryability flags
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use thiserror::Error;

use crate::capture::CaptureError;

/// Result type alias for cavemon operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    NotInitialized,
    PersistenceError,

    // Not Found (exit 3)
    RecordNotFound,
    InvalidRecordId,

    // Validation (exit 4)
    ValidationError,
    CaptureError,

    // Export (exit 5)
    QrGenerationError,
    ArchiveError,
    NothingToExport,

    // Sync (exit 6)
    Offline,
    SyncInProgress,
    SyncRunError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::PersistenceError => "PERSISTENCE_ERROR",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::InvalidRecordId => "INVALID_RECORD_ID",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::CaptureError => "CAPTURE_ERROR",
            Self::QrGenerationError => "QR_GENERATION_ERROR",
            Self::ArchiveError => "ARCHIVE_ERROR",
            Self::NothingToExport => "NOTHING_TO_EXPORT",
            Self::Offline => "OFFLINE",
            Self::SyncInProgress => "SYNC_IN_PROGRESS",
            Self::SyncRunError => "SYNC_RUN_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::PersistenceError => 2,
            Self::RecordNotFound | Self::InvalidRecordId => 3,
            Self::ValidationError | Self::CaptureError => 4,
            Self::QrGenerationError | Self::ArchiveError | Self::NothingToExport => 5,
            Self::Offline | Self::SyncInProgress | Self::SyncRunError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the same call may succeed if simply retried later.
    ///
    /// True for transient conditions (offline, busy database, a sync run
    /// already in flight, a partially failed sync).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PersistenceError | Self::Offline | Self::SyncInProgress | Self::SyncRunError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in cavemon operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `cavemon init` first")]
    NotInitialized,

    #[error("Storage error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Record not found: {id}")]
    RecordNotFound { id: i64 },

    #[error("Invalid record id")]
    InvalidRecordId,

    #[error("Invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("Image capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("QR code generation failed for record {id}: {message}")]
    QrGeneration { id: i64, message: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("No records to export")]
    NothingToExport,

    #[error("Offline: cannot sync without a network connection")]
    Offline,

    #[error("A sync run is already in progress")]
    SyncInProgress,

    #[error("Sync failed after {succeeded} of {total} records: {message}")]
    SyncRun {
        succeeded: usize,
        total: usize,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a validation failure on a named form field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::Persistence(_) => ErrorCode::PersistenceError,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::InvalidRecordId => ErrorCode::InvalidRecordId,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::Capture(_) => ErrorCode::CaptureError,
            Self::QrGeneration { .. } => ErrorCode::QrGenerationError,
            Self::Archive(_) => ErrorCode::ArchiveError,
            Self::NothingToExport => ErrorCode::NothingToExport,
            Self::Offline => ErrorCode::Offline,
            Self::SyncInProgress => ErrorCode::SyncInProgress,
            Self::SyncRun { .. } => ErrorCode::SyncRunError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `cavemon init` to create the local database".to_string())
            }

            Self::RecordNotFound { id } => Some(format!(
                "No record with id {id}. Use `cavemon list` to see stored records."
            )),

            Self::InvalidRecordId => {
                Some("Record ids are positive integers shown by `cavemon list`.".to_string())
            }

            Self::Validation { field, .. } => match *field {
                "personInChargeOther" => Some(
                    "When the person in charge is \"Otro\", pass --person-other \"<name>\"."
                        .to_string(),
                ),
                "diligenciamientoDate" => Some("Dates use the ISO format YYYY-MM-DD.".to_string()),
                "image" => Some("Images must be 10 MB or smaller.".to_string()),
                _ => None,
            },

            Self::NothingToExport => {
                Some("Add a record with `cavemon add` before exporting.".to_string())
            }

            Self::Offline => Some(
                "Records stay queued locally. Run `cavemon sync` again once connected.".to_string(),
            ),

            Self::SyncInProgress => Some("Wait for the running sync to finish.".to_string()),

            Self::SyncRun { .. } => Some(
                "Records already synced keep their state. Run `cavemon sync` to retry the rest."
                    .to_string(),
            ),

            Self::Persistence(_)
            | Self::Capture(_)
            | Self::QrGeneration { .. }
            | Self::Archive(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::RecordNotFound { id: 7 }.exit_code(), 3);
        assert_eq!(Error::InvalidRecordId.exit_code(), 3);
        assert_eq!(Error::validation("caveName", "required").exit_code(), 4);
        assert_eq!(Error::NothingToExport.exit_code(), 5);
        assert_eq!(Error::Offline.exit_code(), 6);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::RecordNotFound { id: 42 }.to_structured_json();
        assert_eq!(json["error"]["code"], "RECORD_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert_eq!(json["error"]["retryable"], false);
        assert!(json["error"]["hint"].as_str().unwrap().contains("42"));
    }

    #[test]
    fn test_sync_run_message_reports_progress() {
        let err = Error::SyncRun {
            succeeded: 2,
            total: 3,
            message: "record 5 rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Sync failed after 2 of 3 records: record 5 rejected"
        );
        assert!(err.error_code().is_retryable());
    }
}
