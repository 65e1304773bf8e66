//! cavemon - local-first field records for cave drip monitoring
//!
//! This crate provides the core functionality for the `cavemon` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (RecordDraft, MonitoringRecord, RecordPatch)
//! - [`storage`] - SQLite record store, audit events, change feed
//! - [`identifier`] - customId and export file names
//! - [`validate`] - Form validation
//! - [`capture`] - Loading photos from disk
//! - [`export`] - JSON/CSV/QR rendering and zip archives
//! - [`sync`] - Pushing unsynced records to a remote
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod identifier;
pub mod model;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};

/// Global silent mode flag for `--silent` output.
///
/// When set, commands print only the record id or written path
/// instead of full output. Avoids threading a `silent` bool
/// through every handler signature.
pub static SILENT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if silent mode is active.
#[inline]
pub fn is_silent() -> bool {
    SILENT.load(std::sync::atomic::Ordering::Relaxed)
}

/// Escape a value for CSV output (wrap in quotes if it contains commas, quotes, or newlines).
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
