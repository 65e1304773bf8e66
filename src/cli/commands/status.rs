//! Status command implementation.

use crate::cli::commands::open_store;
use crate::error::Result;
use crate::sync::{get_sync_status, print_status};
use std::path::PathBuf;

/// Execute status command.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let store = open_store(db_path)?;
    let status = get_sync_status(&store)?;

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else if crate::is_silent() {
        println!("{}", status.unsynced_records);
    } else {
        print_status(&status);
    }

    Ok(())
}
