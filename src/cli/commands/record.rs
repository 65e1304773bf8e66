//! Record command implementations (add, update, delete, show, list).

use crate::capture::load_image;
use crate::cli::{AddArgs, OutputFormat, UpdateArgs};
use crate::cli::commands::{open_store, resolve_actor};
use crate::config::Settings;
use crate::error::Result;
use crate::export::{to_csv, to_json, ImageNaming};
use crate::export::image::decoded_len;
use crate::model::{MonitoringRecord, RecordDraft};
use crate::storage::events::Event;
use crate::sync::CommitReceipt;
use crate::validate::{unusual_values, validate_draft};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

/// Output for add/update/delete.
#[derive(Serialize)]
struct MutationOutput {
    id: i64,
    #[serde(rename = "customId")]
    custom_id: String,
    synced: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
}

/// Output for show --history.
#[derive(Serialize)]
struct HistoryOutput {
    record: MonitoringRecord,
    events: Vec<Event>,
    receipts: Vec<CommitReceipt>,
}

/// Warn about values outside the form's usual options.
///
/// These are stored as given; the form only suggests values.
fn report_unusual(draft: &RecordDraft) -> Vec<String> {
    unusual_values(draft)
        .into_iter()
        .map(|(field, value)| {
            warn!(field, value = %value, "Unusual value");
            format!("{field}: '{value}' is not one of the usual options")
        })
        .collect()
}

/// Execute add command.
pub fn execute_add(
    args: &AddArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let settings = Settings::load_default()?;
    let actor = resolve_actor(actor, &settings);

    let image = args.fields.image.as_deref().map(load_image).transpose()?;
    let mut draft = args.fields.to_draft(image);
    if draft.diligenciamiento_date.is_empty() {
        draft.diligenciamiento_date = chrono::Local::now().date_naive().to_string();
    }
    validate_draft(&draft)?;
    let warnings = report_unusual(&draft);

    let mut store = open_store(db_path)?;
    let id = store.add(&draft, &actor)?;
    let record = store.get(id)?;
    info!(id, custom_id = %record.custom_id, "Record added");

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json {
        let output = MutationOutput {
            id,
            custom_id: record.custom_id,
            synced: record.synced,
            warnings,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} Added record {id}", "✓".green());
        println!("  {}", record.custom_id.dimmed());
    }

    Ok(())
}

/// Execute update command.
pub fn execute_update(
    args: &UpdateArgs,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let settings = Settings::load_default()?;
    let actor = resolve_actor(actor, &settings);

    let image = if args.remove_image {
        Some(None)
    } else {
        args.fields.image.as_deref().map(load_image).transpose()?.map(Some)
    };
    let patch = args.fields.to_patch(image);

    let mut store = open_store(db_path)?;
    let current = store.get(args.id)?;

    // Validate the merged result, not the patch alone.
    let mut merged = current.data.clone();
    patch.apply(&mut merged);
    validate_draft(&merged)?;
    let warnings = report_unusual(&merged);

    if patch.is_empty() {
        warn!(id = args.id, "No fields given; the record is still marked unsynced");
    }

    store.update(args.id, &patch, &actor)?;
    info!(id = args.id, "Record updated");

    if crate::is_silent() {
        println!("{}", args.id);
        return Ok(());
    }

    if json {
        let output = MutationOutput {
            id: args.id,
            custom_id: current.custom_id,
            synced: false,
            warnings,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{} Updated record {}", "✓".green(), args.id);
        if current.synced {
            println!("  {}", "Marked unsynced; run 'cavemon sync' to send it again.".dimmed());
        }
    }

    Ok(())
}

/// Execute delete command.
pub fn execute_delete(
    id: i64,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let settings = Settings::load_default()?;
    let actor = resolve_actor(actor, &settings);

    let mut store = open_store(db_path)?;
    store.delete(Some(id), &actor)?;
    info!(id, "Record deleted");

    if crate::is_silent() {
        println!("{id}");
    } else if json {
        println!("{}", serde_json::json!({ "id": id, "deleted": true }));
    } else {
        println!("{} Deleted record {id}", "✓".green());
    }

    Ok(())
}

/// Execute show command.
pub fn execute_show(id: i64, history: bool, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path)?;
    let record = store.get(id)?;

    if json {
        if history {
            let output = HistoryOutput {
                events: store.events(id)?,
                receipts: store.receipts(id)?,
                record,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        return Ok(());
    }

    print_record(&record);

    if history {
        println!();
        println!("{}", "History".bold());
        for event in store.events(id)? {
            let when = format_millis(event.created_at);
            let detail = match (&event.old_value, &event.new_value) {
                (Some(old), Some(new)) => format!(" ({old} → {new})"),
                _ => event.comment.as_ref().map(|c| format!(" ({c})")).unwrap_or_default(),
            };
            println!("  {when}  {:<15} {}{detail}", event.event_type.as_str(), event.actor);
        }

        let receipts = store.receipts(id)?;
        if !receipts.is_empty() {
            println!();
            println!("{}", "Commits".bold());
            for receipt in receipts {
                println!(
                    "  {}  {}",
                    format_millis(receipt.committed_at),
                    &receipt.content_hash[..receipt.content_hash.len().min(12)]
                );
            }
        }
    }

    Ok(())
}

/// Execute list command.
pub fn execute_list(
    unsynced: bool,
    format: &OutputFormat,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let store = open_store(db_path)?;
    let records = if unsynced {
        let mut pending = store.list_unsynced()?;
        pending.reverse();
        pending
    } else {
        store.list()?
    };

    if *format == OutputFormat::Csv {
        print!("{}", to_csv(&records)?);
        println!();
        return Ok(());
    }

    if json {
        println!("{}", to_json(&records, ImageNaming::CustomId)?);
        return Ok(());
    }

    if crate::is_silent() {
        for record in &records {
            println!("{}", record.id_or_default());
        }
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "No records.".dimmed());
        return Ok(());
    }

    println!(
        "{:>5}  {:<10}  {:<20}  {:<22}  {}",
        "ID", "DATE", "CAVE", "PERSON", "SYNCED"
    );
    for record in &records {
        let synced = if record.synced {
            "yes".green()
        } else {
            "pending".yellow()
        };
        println!(
            "{:>5}  {:<10}  {:<20}  {:<22}  {}",
            record.id_or_default(),
            record.data.diligenciamiento_date,
            truncate(&record.data.cave_name, 20),
            truncate(record.data.effective_person().unwrap_or_default(), 22),
            synced
        );
    }
    println!();
    println!("{} record(s)", records.len());

    Ok(())
}

fn print_record(record: &MonitoringRecord) {
    let d = &record.data;
    println!("{} {}", format!("Record {}", record.id_or_default()).bold(), record.custom_id.dimmed());
    println!();

    let rows: [(&str, &str); 11] = [
        ("Cave", d.cave_name.as_str()),
        ("Person", d.effective_person().unwrap_or_default()),
        ("Date", d.diligenciamiento_date.as_str()),
        ("Active drip", d.active_drip.as_str()),
        ("Drip count", d.drip_count.as_str()),
        ("Test tube", d.test_tube_sample_name.as_str()),
        ("Watch glass", d.watch_glass_sample_name.as_str()),
        ("Rained", d.has_it_rained.as_str()),
        ("Glass fallen", d.watch_glass_fallen.as_str()),
        ("Carbonate", d.carbonate_observed.as_str()),
        ("Observations", d.observations.as_str()),
    ];
    for (label, value) in rows.iter().filter(|(_, v)| !v.is_empty()) {
        println!("  {label:<13} {value}");
    }

    if let Some(image) = d.image.as_deref().filter(|s| !s.is_empty()) {
        let size = decoded_len(image).map_or_else(|| "invalid".to_string(), |n| format!("{n} bytes"));
        println!("  {:<13} {size}", "Photo");
    }

    let synced = if record.synced { "yes".green() } else { "pending".yellow() };
    println!("  {:<13} {synced}", "Synced");
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
