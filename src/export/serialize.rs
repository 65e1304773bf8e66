//! JSON and CSV rendering of records.
//!
//! Exports never carry image bytes. The `image` field is replaced by an
//! `imageName` pointing at the PNG stored next to the export, or `null`
//! when the record has no photo.

use serde_json::{Map, Value};

use crate::csv_escape;
use crate::error::{Error, Result};
use crate::identifier::{archive_base_name, export_file_stem, export_file_stems};
use crate::model::MonitoringRecord;

/// UTF-8 byte-order mark prepended to CSV files for spreadsheet apps.
pub const BOM: &str = "\u{feff}";

/// Column order of batch CSV exports.
pub const CSV_HEADERS: [&str; 16] = [
    "id",
    "customId",
    "caveName",
    "personInCharge",
    "personInChargeOther",
    "diligenciamientoDate",
    "activeDrip",
    "dripCount",
    "testTubeSampleName",
    "watchGlassSampleName",
    "hasItRained",
    "watchGlassFallen",
    "observations",
    "carbonateObserved",
    "imageName",
    "synced",
];

/// How an exported record names its photo file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageNaming {
    /// `<customId>.png`, or `record_<id>.png` for legacy rows. In a batch,
    /// a repeated `customId` gets `_<id>` appended.
    CustomId,
    /// `<cave>-<person>-<date>.png`, the single-record archive base name.
    ArchiveBase,
}

impl ImageNaming {
    fn stem(self, record: &MonitoringRecord) -> String {
        match self {
            Self::CustomId => export_file_stem(record),
            Self::ArchiveBase => archive_base_name(record),
        }
    }

    fn stems(self, records: &[MonitoringRecord]) -> Vec<String> {
        match self {
            Self::CustomId => export_file_stems(records),
            Self::ArchiveBase => records.iter().map(archive_base_name).collect(),
        }
    }
}

/// The export shape of one record: every field except `image`, plus `imageName`.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn export_object(record: &MonitoringRecord, naming: ImageNaming) -> Result<Map<String, Value>> {
    object_with_stem(record, &naming.stem(record))
}

fn object_with_stem(record: &MonitoringRecord, stem: &str) -> Result<Map<String, Value>> {
    let mut map = record_object(record)?;
    map.insert(
        "imageName".to_string(),
        record
            .data
            .has_image()
            .then(|| format!("{stem}.png"))
            .map_or(Value::Null, Value::String),
    );
    Ok(map)
}

/// The record as a JSON object without its `image`.
fn record_object(record: &MonitoringRecord) -> Result<Map<String, Value>> {
    let mut map = into_object(serde_json::to_value(record)?)?;
    map.shift_remove("image");
    Ok(map)
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::Other(format!(
            "record serialized to a JSON {} instead of an object",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn batch_objects(
    records: &[MonitoringRecord],
    naming: ImageNaming,
) -> Result<Vec<Map<String, Value>>> {
    records
        .iter()
        .zip(naming.stems(records))
        .map(|(record, stem)| object_with_stem(record, &stem))
        .collect()
}

/// Pretty JSON (2-space indent) of a batch of records, as an array.
///
/// The same bytes are used for the `.txt` mirror.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(records: &[MonitoringRecord], naming: ImageNaming) -> Result<String> {
    let objects: Vec<Value> = batch_objects(records, naming)?
        .into_iter()
        .map(Value::Object)
        .collect();
    Ok(serde_json::to_string_pretty(&objects)?)
}

/// Pretty JSON (2-space indent) of one record, as an object.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_single(record: &MonitoringRecord, naming: ImageNaming) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_object(record, naming)?)?)
}

/// Stringify a JSON value for a CSV cell. `null` becomes empty.
fn cell(value: Option<&Value>) -> String {
    let raw = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    csv_escape(&raw)
}

/// CSV of a batch of records with the fixed [`CSV_HEADERS`] columns.
///
/// Rows are joined with `\n` and the output starts with a BOM.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_csv(records: &[MonitoringRecord]) -> Result<String> {
    let mut rows = vec![CSV_HEADERS.join(",")];
    for object in batch_objects(records, ImageNaming::CustomId)? {
        let values: Vec<String> = CSV_HEADERS.iter().map(|h| cell(object.get(*h))).collect();
        rows.push(values.join(","));
    }
    Ok(format!("{BOM}{}", rows.join("\n")))
}

/// CSV of one record whose header is the export object's own keys.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_csv_single(record: &MonitoringRecord, naming: ImageNaming) -> Result<String> {
    let object = export_object(record, naming)?;
    let header: Vec<&str> = object.keys().map(String::as_str).collect();
    let values: Vec<String> = object.values().map(|v| cell(Some(v))).collect();
    Ok(format!("{BOM}{}\n{}", header.join(","), values.join(",")))
}

/// JSON of the record without its photo, as encoded into QR codes.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn qr_payload(record: &MonitoringRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(&record_object(record)?)?)
}
