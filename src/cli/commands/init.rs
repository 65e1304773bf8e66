//! Create the record database.
//!
//! The database lives at `~/.cavemon/data/cavemon.db` unless `--db` or
//! `CAVEMON_DB` points elsewhere. With `CAVEMON_TEST_DB=1` it is created
//! under `~/.cavemon/test/` instead. A default `config.json` is written next
//! to it the first time, so the settings are easy to find and edit.

use crate::config::{resolve_db_path, settings_path, Settings};
use crate::error::{Error, Result};
use crate::storage::RecordStore;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    settings: Option<PathBuf>,
}

/// Execute the init command.
///
/// Running it on an existing database is a no-op unless `force` is set, in
/// which case the file is removed and created again.
///
/// # Errors
///
/// Returns an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(|p| p.as_path())).ok_or_else(|| {
        Error::Config("Could not determine the cavemon directory".to_string())
    })?;

    let existed = db_path.exists();
    if existed && force {
        fs::remove_file(&db_path)?;
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = db_path.clone().into_os_string();
            sidecar.push(suffix);
            let _ = fs::remove_file(PathBuf::from(sidecar));
        }
        info!(path = %db_path.display(), "Removed existing database");
    }

    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Opening applies the schema and pending migrations.
    RecordStore::open(&db_path)?;
    let created = !existed || force;

    let settings = match settings_path() {
        Some(path) if !path.exists() => {
            Settings::default().save(&path)?;
            Some(path)
        }
        _ => None,
    };

    if json {
        let output = InitOutput {
            database: db_path,
            created,
            settings,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if crate::is_silent() {
        println!("{}", db_path.display());
    } else {
        if created {
            println!("Initialized cavemon database");
        } else {
            println!("Database already initialized (use --force to recreate)");
        }
        println!("  Database: {}", db_path.display());
        if let Some(path) = settings {
            println!("  Settings: {}", path.display());
        }
    }

    Ok(())
}
