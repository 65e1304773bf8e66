//! Export command implementations (zip archives and QR codes).

use crate::cli::ExportCommands;
use crate::cli::commands::open_store;
use crate::config::Settings;
use crate::error::Result;
use crate::export::{atomic_write, build_archive, to_qr_png, write_archive, Archive, ArchiveScope};
use crate::identifier::export_file_stem;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct ExportOutput {
    path: PathBuf,
    records: usize,
    bytes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped_qr: Vec<i64>,
}

/// Execute export commands.
pub fn execute(command: &ExportCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load_default()?;
    let store = open_store(db_path)?;
    // Full archives are dated by the UTC day, whatever the local zone.
    let today = chrono::Utc::now().date_naive();

    let (records, out) = match command {
        ExportCommands::Record { id, out } => (vec![store.get(*id)?], out.as_deref()),
        ExportCommands::All { out } => {
            // Oldest first, the order records were taken in.
            let mut records = store.list()?;
            records.reverse();
            (records, out.as_deref())
        }
    };
    let scope = match command {
        ExportCommands::Record { .. } => ArchiveScope::Single,
        ExportCommands::All { .. } => ArchiveScope::Full,
    };

    let archive = build_archive(scope, &records, today)?;
    let path = write_archive(&settings.export_dir(out), &archive)?;
    info!(path = %path.display(), records = records.len(), "Archive written");

    report(&archive, &path, records.len(), json)
}

fn report(archive: &Archive, path: &Path, records: usize, json: bool) -> Result<()> {
    if crate::is_silent() {
        println!("{}", path.display());
    } else if json {
        let output = ExportOutput {
            path: path.to_path_buf(),
            records,
            bytes: archive.bytes.len(),
            skipped_qr: archive.skipped_qr.clone(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} Exported {records} record(s)", "✓".green());
        println!("  {}", path.display());
        if !archive.skipped_qr.is_empty() {
            let ids: Vec<String> = archive.skipped_qr.iter().map(ToString::to_string).collect();
            println!(
                "  {}",
                format!("QR code skipped for record(s) {}", ids.join(", ")).yellow()
            );
        }
    }
    Ok(())
}

/// Execute qr command.
pub fn execute_qr(
    id: i64,
    out: Option<&Path>,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let settings = Settings::load_default()?;
    let store = open_store(db_path)?;
    let record = store.get(id)?;

    let png = to_qr_png(&record)?;
    let path = match out {
        Some(path) => path.to_path_buf(),
        None => settings
            .export_dir(None)
            .join(format!("{}_QR.png", export_file_stem(&record))),
    };
    atomic_write(&path, &png)?;
    info!(id, path = %path.display(), "QR code written");

    if crate::is_silent() {
        println!("{}", path.display());
    } else if json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "path": path, "bytes": png.len() })
        );
    } else {
        println!("{} QR code for record {id}", "✓".green());
        println!("  {}", path.display());
    }

    Ok(())
}
