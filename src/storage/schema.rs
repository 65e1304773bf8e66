//! Database schema definitions.
//!
//! The base schema creates the current shape of every table. Databases
//! created by older releases are brought forward by [`super::migrations`].

use rusqlite::{Connection, Result};

/// Current schema version for migration tracking.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// The complete SQL schema for the cavemon database.
///
/// Timestamps are stored as INTEGER (Unix milliseconds).
pub const SCHEMA_SQL: &str = r"
-- ====================
-- Schema Version Tracking
-- ====================

CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at INTEGER NOT NULL
);

-- ====================
-- Monitoring Records
-- ====================

-- AUTOINCREMENT keeps ids from being reused after a delete.
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    custom_id TEXT NOT NULL DEFAULT '',
    cave_name TEXT NOT NULL DEFAULT '',
    person_in_charge TEXT NOT NULL DEFAULT '',
    person_in_charge_other TEXT,
    diligenciamiento_date TEXT NOT NULL DEFAULT '',
    active_drip TEXT NOT NULL DEFAULT '',
    drip_count TEXT NOT NULL DEFAULT '',
    test_tube_sample_name TEXT NOT NULL DEFAULT '',
    watch_glass_sample_name TEXT NOT NULL DEFAULT '',
    has_it_rained TEXT NOT NULL DEFAULT '',
    watch_glass_fallen TEXT NOT NULL DEFAULT '',
    observations TEXT NOT NULL DEFAULT '',
    carbonate_observed TEXT NOT NULL DEFAULT '',
    image TEXT,
    synced INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL DEFAULT 0,
    -- Bumped by every update, including ones that change nothing.
    revision INTEGER NOT NULL DEFAULT 0
);

-- ====================
-- Remote Commit Receipts
-- ====================

-- One row per confirmed commit. No foreign key: receipts outlive
-- records deleted after they synced.
CREATE TABLE IF NOT EXISTS remote_commits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id INTEGER NOT NULL,
    custom_id TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    committed_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_remote_commits_record ON remote_commits(record_id);

-- ====================
-- Audit Events
-- ====================

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    event_type TEXT NOT NULL,
    actor TEXT NOT NULL,
    old_value TEXT,
    new_value TEXT,
    comment TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id);
CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at DESC);
";

/// Apply the schema to a database connection.
///
/// Sets connection pragmas, creates missing tables, runs pending
/// migrations, and records the schema version. Safe to call on every open.
///
/// # Errors
///
/// Returns an error if the SQL execution fails or pragmas cannot be set.
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;

    conn.execute_batch(SCHEMA_SQL)?;

    super::migrations::run_migrations(conn)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![
            format!("v{CURRENT_SCHEMA_VERSION}"),
            chrono::Utc::now().timestamp_millis()
        ],
    )?;

    Ok(())
}
