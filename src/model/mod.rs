//! Data models for cavemon.
//!
//! - `MonitoringRecord` - a persisted field observation
//! - `RecordDraft` - the form payload used to create one
//! - `RecordPatch` - a partial edit

pub mod record;

pub use record::{MonitoringRecord, RecordDraft, RecordPatch, PERSON_OTHER};
