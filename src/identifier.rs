//! Human-readable record identifiers and export file names.
//!
//! `customId` is derived once, when a record is first stored:
//!
//! ```text
//! <cave>-<date>-<person>-<creation millis>
//! ```
//!
//! with whitespace runs in the cave and person names collapsed to `_`.
//! Uniqueness rests on the millisecond component alone; two inserts for the
//! same cave, date and person within one millisecond collide.

use std::collections::HashSet;

use crate::model::{MonitoringRecord, RecordDraft, PERSON_OTHER};

/// Trim and collapse every internal whitespace run to a single underscore.
#[must_use]
pub fn sanitize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Derive the `customId` for a draft created at `created_at_ms`.
#[must_use]
pub fn custom_id(draft: &RecordDraft, created_at_ms: i64) -> String {
    format!(
        "{}-{}-{}-{}",
        sanitize(&draft.cave_name),
        draft.diligenciamiento_date,
        sanitize(draft.effective_person().unwrap_or_default()),
        created_at_ms
    )
}

/// Base file name for a single-record archive.
///
/// Built from the record's current fields, not from the stored `customId`:
/// `<cave>-<person>-<date>`. An "Otro" person without a name falls back to
/// the literal "Otro".
#[must_use]
pub fn archive_base_name(record: &MonitoringRecord) -> String {
    let data = &record.data;
    let person = if data.person_in_charge == PERSON_OTHER {
        data.person_in_charge_other
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(PERSON_OTHER)
    } else {
        data.person_in_charge.as_str()
    };

    format!(
        "{}-{}-{}",
        sanitize(&data.cave_name),
        sanitize(person),
        data.diligenciamiento_date
    )
}

/// Stem for per-record files inside a full export (`images/`, `qrcodes/`).
///
/// The `customId` when set, else `record_<id>` for legacy rows.
#[must_use]
pub fn export_file_stem(record: &MonitoringRecord) -> String {
    if record.custom_id.is_empty() {
        format!("record_{}", record.id_or_default())
    } else {
        record.custom_id.clone()
    }
}

/// [`export_file_stem`] for a batch, one per record and all distinct.
///
/// A stem already taken by an earlier record gets `_<id>` appended, so
/// colliding `customId`s still map to separate files.
#[must_use]
pub fn export_file_stems(records: &[MonitoringRecord]) -> Vec<String> {
    let mut taken = HashSet::new();
    records
        .iter()
        .map(|record| {
            let mut stem = export_file_stem(record);
            while !taken.insert(stem.clone()) {
                stem = format!("{stem}_{}", record.id_or_default());
            }
            stem
        })
        .collect()
}
