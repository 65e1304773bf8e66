//! Zip archive builder.
//!
//! Bundles records with their serialized forms, photos and QR codes into a
//! deflate-compressed zip held entirely in memory. Callers either receive a
//! complete [`Archive`] or an error, never a partial file.
//!
//! Layouts:
//!
//! ```text
//! Single                      Full
//! <base>.json                 monitoreo-cavernas.json
//! <base>.txt                  monitoreo-cavernas.txt
//! <base>.csv                  monitoreo-cavernas.csv
//! <base>.png                  images/<stem>.png
//! <base>_QR.png               qrcodes/<stem>_QR.png
//! ```
//!
//! `<stem>` is the `customId`, with `_<id>` appended when an earlier record
//! in the same export already uses it.

use std::io::{Cursor, Write};

use chrono::NaiveDate;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::export::image::decode_data_uri;
use crate::export::qr::to_qr_png;
use crate::export::serialize::{to_csv, to_csv_single, to_json, to_json_single, ImageNaming};
use crate::identifier::{archive_base_name, export_file_stem, export_file_stems};
use crate::model::MonitoringRecord;

/// Base name of the data files inside a full export.
pub const FULL_EXPORT_BASE: &str = "monitoreo-cavernas";

/// What an archive covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveScope {
    /// One record, named after its cave, person and date.
    Single,
    /// Every record passed in, dated with the export day.
    Full,
}

/// A finished archive ready to be written or handed to a user.
#[derive(Debug, Clone)]
pub struct Archive {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Ids of records whose QR code could not be generated.
    pub skipped_qr: Vec<i64>,
}

/// Build an archive over `records`.
///
/// `Single` uses the first record only. QR failures are logged and listed in
/// [`Archive::skipped_qr`] without aborting the archive.
///
/// # Errors
///
/// Returns [`Error::NothingToExport`] if `records` is empty, or
/// [`Error::Archive`] if the zip container cannot be written.
pub fn build_archive(
    scope: ArchiveScope,
    records: &[MonitoringRecord],
    today: NaiveDate,
) -> Result<Archive> {
    let Some(first) = records.first() else {
        return Err(Error::NothingToExport);
    };

    let mut builder = ZipBuilder::new();
    let filename = match scope {
        ArchiveScope::Single => {
            let base = archive_base_name(first);
            let naming = ImageNaming::ArchiveBase;
            let json = to_json_single(first, naming)?;

            builder.add(&format!("{base}.json"), json.as_bytes())?;
            builder.add(&format!("{base}.txt"), json.as_bytes())?;
            builder.add(&format!("{base}.csv"), to_csv_single(first, naming)?.as_bytes())?;
            builder.add_image(first, &format!("{base}.png"))?;
            builder.add_qr(first, &format!("{base}_QR.png"))?;

            format!("{base}.zip")
        }
        ArchiveScope::Full => {
            let json = to_json(records, ImageNaming::CustomId)?;

            builder.add(&format!("{FULL_EXPORT_BASE}.json"), json.as_bytes())?;
            builder.add(&format!("{FULL_EXPORT_BASE}.txt"), json.as_bytes())?;
            builder.add(&format!("{FULL_EXPORT_BASE}.csv"), to_csv(records)?.as_bytes())?;

            for (record, stem) in records.iter().zip(export_file_stems(records)) {
                if stem != export_file_stem(record) {
                    warn!(
                        record = record.id_or_default(),
                        custom_id = %record.custom_id,
                        renamed = %stem,
                        "Duplicate customId, files renamed"
                    );
                }
                builder.add_image(record, &format!("images/{stem}.png"))?;
                builder.add_qr(record, &format!("qrcodes/{stem}_QR.png"))?;
            }

            format!("export-monitoreo-cavernas-{}.zip", today.format("%Y-%m-%d"))
        }
    };

    let (bytes, skipped_qr) = builder.finish()?;
    debug!(
        filename = %filename,
        records = records.len(),
        size = bytes.len(),
        skipped_qr = skipped_qr.len(),
        "Built archive"
    );

    Ok(Archive {
        filename,
        bytes,
        skipped_qr,
    })
}

fn zip_error(e: impl std::fmt::Display) -> Error {
    Error::Archive(e.to_string())
}

struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    skipped_qr: Vec<i64>,
}

impl ZipBuilder {
    fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            skipped_qr: Vec::new(),
        }
    }

    fn add(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.writer.start_file(name, self.options).map_err(zip_error)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Add the record's photo if it has one that decodes.
    fn add_image(&mut self, record: &MonitoringRecord, name: &str) -> Result<()> {
        let Some(uri) = record.data.image.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };
        match decode_data_uri(uri) {
            Some(bytes) => self.add(name, &bytes),
            None => {
                warn!(
                    record = record.id_or_default(),
                    "Image payload does not decode, photo omitted"
                );
                Ok(())
            }
        }
    }

    /// Add the record's QR code, recording the id on failure.
    fn add_qr(&mut self, record: &MonitoringRecord, name: &str) -> Result<()> {
        match to_qr_png(record) {
            Ok(png) => self.add(name, &png),
            Err(e) => {
                warn!(record = record.id_or_default(), error = %e, "Skipping QR code");
                self.skipped_qr.push(record.id_or_default());
                Ok(())
            }
        }
    }

    fn finish(self) -> Result<(Vec<u8>, Vec<i64>)> {
        let cursor = self.writer.finish().map_err(zip_error)?;
        Ok((cursor.into_inner(), self.skipped_qr))
    }
}
