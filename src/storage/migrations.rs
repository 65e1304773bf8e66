//! Database migrations embedded at compile time.
//!
//! Migrations are sourced from `/migrations/` at the repo root and
//! embedded into the binary using `include_str!`. Each one is additive:
//! a single new column with a default, or new indexes, so rows written by
//! older releases read back with empty or false values.

use rusqlite::{Connection, Result};
use tracing::{info, warn};

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order, embedded at compile time.
///
/// Version names match the SQL filenames (without .sql extension).
/// The `schema_migrations` table tracks which have been applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_add_custom_id",
        sql: include_str!("../../migrations/001_add_custom_id.sql"),
    },
    Migration {
        version: "002_add_synced",
        sql: include_str!("../../migrations/002_add_synced.sql"),
    },
    Migration {
        version: "003_add_created_at",
        sql: include_str!("../../migrations/003_add_created_at.sql"),
    },
    Migration {
        version: "004_add_updated_at",
        sql: include_str!("../../migrations/004_add_updated_at.sql"),
    },
    Migration {
        version: "005_lookup_indexes",
        sql: include_str!("../../migrations/005_lookup_indexes.sql"),
    },
    Migration {
        version: "006_add_revision",
        sql: include_str!("../../migrations/006_add_revision.sql"),
    },
];

/// Version of the newest embedded migration.
#[must_use]
pub fn latest_version() -> &'static str {
    MIGRATIONS.last().map_or("none", |m| m.version)
}

/// Run all pending migrations on the database.
///
/// Already-applied migrations (tracked in `schema_migrations`) are skipped,
/// so this is safe to call on every open.
///
/// # Errors
///
/// Returns an error if a migration fails to apply. An ALTER TABLE that hits
/// an existing column is logged and marked complete, since fresh databases
/// get every column from the base schema.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        if let Err(e) = conn.execute_batch(migration.sql) {
            if e.to_string().contains("duplicate column name") {
                warn!(
                    version = migration.version,
                    "Migration partially applied (columns exist), marking complete"
                );
            } else {
                return Err(e);
            }
        }

        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;

        info!(version = migration.version, "Migration complete");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{apply_schema, SCHEMA_SQL};

    /// Table layout written by the first release, before sync support.
    const LEGACY_RECORDS: &str = "
        CREATE TABLE records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
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
            image TEXT
        );
    ";

    fn migration_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version NOT LIKE 'v%'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        run_migrations(&conn).expect("Migrations should apply to fresh database");

        assert_eq!(migration_count(&conn), i64::try_from(MIGRATIONS.len()).unwrap());
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        run_migrations(&conn).expect("First run should succeed");
        run_migrations(&conn).expect("Second run should succeed (idempotent)");

        assert_eq!(migration_count(&conn), 5);
    }

    #[test]
    fn test_legacy_rows_gain_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(LEGACY_RECORDS).unwrap();
        conn.execute(
            "INSERT INTO records (cave_name, person_in_charge, diligenciamiento_date)
             VALUES ('La Fábrica', 'Nicolas Peña', '2023-10-01')",
            [],
        )
        .unwrap();

        apply_schema(&conn).expect("Legacy database should upgrade");

        let (custom_id, synced, created_at): (String, bool, i64) = conn
            .query_row(
                "SELECT custom_id, synced, created_at FROM records WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(custom_id, "");
        assert!(!synced);
        assert_eq!(created_at, 0);

        let indexed: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_records_synced'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(indexed, 1);
    }
}
