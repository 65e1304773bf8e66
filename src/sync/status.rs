//! Sync status display.
//!
//! Summarizes how many records are stored, how many still wait for the
//! remote, and when the last commit happened.

use colored::Colorize;

use crate::error::Result;
use crate::storage::RecordStore;
use crate::sync::types::SyncStatus;

/// Collect the sync status of a store.
///
/// # Errors
///
/// Returns an error if database queries fail.
pub fn get_sync_status(store: &RecordStore) -> Result<SyncStatus> {
    let total_records = store.count()?;
    let unsynced_records = store.unsynced_count()?;

    Ok(SyncStatus {
        total_records,
        unsynced_records,
        synced_records: total_records.saturating_sub(unsynced_records),
        last_commit_at: store.last_commit()?.map(|r| r.committed_at),
    })
}

/// Format a Unix-millis timestamp for display in local time.
fn format_time(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis).map_or_else(
        || millis.to_string(),
        |t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        },
    )
}

/// Print sync status to stdout in a human-readable format.
pub fn print_status(status: &SyncStatus) {
    println!("{}", "Sync Status".bold().underline());
    println!();

    if status.total_records == 0 {
        println!("{}", "No records stored yet.".dimmed());
        return;
    }

    println!("  Records:  {}", status.total_records);
    println!("  Synced:   {}", status.synced_records.to_string().green());

    if status.unsynced_records > 0 {
        println!("  Pending:  {}", status.unsynced_records.to_string().yellow());
        println!();
        println!("{}", "Run 'cavemon sync' to send pending records.".dimmed());
    } else {
        println!();
        println!("{}", "All records are synced.".green());
    }

    if let Some(at) = status.last_commit_at {
        println!();
        println!("  Last commit: {}", format_time(at));
    }
}
