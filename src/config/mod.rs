//! Configuration management.
//!
//! This module provides functions for locating the cavemon directory,
//! resolving the database path, and loading settings.
//!
//! # Layout
//!
//! ```text
//! ~/.cavemon/
//! ├── config.json        settings (sync latency, probe URL, export dir, actor)
//! ├── preferences.json   UI preferences, never read by the core
//! ├── data/cavemon.db    the record store
//! └── test/cavemon.db    isolated store used when CAVEMON_TEST_DB is set
//! ```

mod preferences;
mod settings;

pub use preferences::{Preferences, CAMERA_PROMPT_SEEN, THEME};
pub use settings::Settings;

use std::path::{Path, PathBuf};

/// Get the global cavemon directory location (`~/.cavemon/`).
#[must_use]
pub fn global_cavemon_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".cavemon"))
}

/// Path of the settings file.
#[must_use]
pub fn settings_path() -> Option<PathBuf> {
    global_cavemon_dir().map(|dir| dir.join("config.json"))
}

/// Path of the preferences file.
#[must_use]
pub fn preferences_path() -> Option<PathBuf> {
    global_cavemon_dir().map(|dir| dir.join("preferences.json"))
}

/// Interpret a boolean-ish environment value.
fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `CAVEMON_TEST_DB=1` (or any non-empty value).
/// This redirects all database operations to an isolated test database.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("CAVEMON_TEST_DB").is_ok_and(|v| is_truthy(&v))
}

/// Get the test database path (`~/.cavemon/test/cavemon.db`).
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_cavemon_dir().map(|dir| dir.join("test").join("cavemon.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided, use it directly
/// 2. `CAVEMON_DB` environment variable
/// 3. `CAVEMON_TEST_DB` environment variable → uses test database
/// 4. Global location: `~/.cavemon/data/cavemon.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no location found.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if let Ok(db_path) = std::env::var("CAVEMON_DB") {
        if !db_path.trim().is_empty() {
            return Some(PathBuf::from(db_path));
        }
    }

    if is_test_mode() {
        return test_db_path();
    }

    global_cavemon_dir().map(|dir| dir.join("data").join("cavemon.db"))
}

/// Get the default actor name.
///
/// Priority:
/// 1. `CAVEMON_ACTOR` environment variable
/// 2. The `actor` setting
/// 3. System username
/// 4. "unknown"
#[must_use]
pub fn default_actor(settings: &Settings) -> String {
    if let Ok(actor) = std::env::var("CAVEMON_ACTOR") {
        if !actor.is_empty() {
            return actor;
        }
    }

    if let Some(actor) = settings.actor.as_deref().filter(|a| !a.is_empty()) {
        return actor.to_string();
    }

    if let Ok(user) = std::env::var("USER") {
        return user;
    }

    "unknown".to_string()
}
