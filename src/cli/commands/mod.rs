//! Command implementations.

pub mod completions;
pub mod export;
pub mod init;
pub mod prefs;
pub mod record;
pub mod status;
pub mod sync;
pub mod version;

use std::path::PathBuf;

use crate::config::{default_actor, resolve_db_path, Settings};
use crate::error::{Error, Result};
use crate::storage::RecordStore;

/// Open the store at the resolved path. The database must already exist.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if there is no database yet.
pub fn open_store(db_path: Option<&PathBuf>) -> Result<RecordStore> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }

    RecordStore::open(&db_path)
}

/// The `--actor` flag, or the configured default.
#[must_use]
pub fn resolve_actor(actor: Option<&str>, settings: &Settings) -> String {
    actor.map_or_else(|| default_actor(settings), ToString::to_string)
}
