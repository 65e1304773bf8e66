//! Sync command implementation.
//!
//! Builds a coordinator over the local store and the configured remote,
//! runs one pass on a tokio runtime, and prints the report. Progress lines
//! come from the store's change feed, so a record is only shown as synced
//! once its flag is committed.

use crate::cli::commands::{open_store, resolve_actor};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::storage::{ChangeKind, StoreChange};
use crate::sync::{SyncCoordinator, SyncReport};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::debug;

/// Execute the sync command.
///
/// # Errors
///
/// Returns [`Error::Offline`] or [`Error::SyncInProgress`] when the run could
/// not start, and [`Error::SyncRun`] when it aborted or some records were
/// rejected by the remote.
pub fn execute(
    offline: bool,
    db_path: Option<&PathBuf>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let settings = Settings::load_default()?;
    let actor = resolve_actor(actor, &settings);
    let store = open_store(db_path)?;
    let changes = store.subscribe();

    let coordinator = SyncCoordinator::new(
        Arc::new(Mutex::new(store)),
        settings.remote(),
        settings.reachability(offline),
        &actor,
    );

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let show_progress = !json && !crate::is_silent();
    let report = rt.block_on(async move {
        let progress = tokio::spawn(print_progress(changes, show_progress));
        let result = coordinator.run().await;
        // Dropping the store closes the feed; the task drains what is left.
        drop(coordinator);
        let _ = progress.await;
        result
    })?;

    print_report(&report, json)?;

    if report.is_success() {
        return Ok(());
    }

    let message = report
        .failures
        .iter()
        .map(|f| format!("record {}: {}", f.record_id, f.message))
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::SyncRun {
        succeeded: report.succeeded,
        total: report.total,
        message,
    })
}

async fn print_progress(mut changes: Receiver<StoreChange>, show: bool) {
    loop {
        match changes.recv().await {
            Ok(StoreChange {
                record_id,
                kind: ChangeKind::Synced,
                ..
            }) => {
                if show {
                    println!("  {} record {record_id}", "✓".green());
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => debug!(missed, "Progress feed lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "state": report.final_state(),
            "report": report,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if crate::is_silent() {
        println!("{}", report.succeeded);
        return Ok(());
    }

    if report.total == 0 {
        println!("{}", "Nothing to sync.".dimmed());
        return Ok(());
    }

    println!();
    println!("Synced {} of {} record(s)", report.succeeded, report.total);
    if report.skipped > 0 {
        println!(
            "  {}",
            format!("{} changed or deleted during the run", report.skipped).dimmed()
        );
    }
    for failure in &report.failures {
        println!(
            "  {} record {}: {}",
            "✗".red(),
            failure.record_id,
            failure.message
        );
    }

    Ok(())
}
