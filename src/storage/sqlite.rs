//! SQLite storage implementation.
//!
//! This module provides the record store for cavemon using SQLite.
//! It follows the MutationContext pattern for transaction discipline, audit
//! logging and change notification.

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, Row, Transaction};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifier::custom_id;
use crate::model::{MonitoringRecord, RecordDraft, RecordPatch};
use crate::storage::changes::{ChangeFeed, ChangeKind, StoreChange};
use crate::storage::events::{get_events, insert_event, Event, EventType, RECORD_ENTITY};
use crate::storage::schema::apply_schema;
use crate::sync::{record_hash, CommitReceipt, MarkOutcome};

/// Columns read into a [`MonitoringRecord`], in mapping order.
const RECORD_COLUMNS: &str = "id, custom_id, cave_name, person_in_charge, person_in_charge_other,
     diligenciamiento_date, active_drip, drip_count, test_tube_sample_name,
     watch_glass_sample_name, has_it_rained, watch_glass_fallen, observations,
     carbonate_observed, image, synced";

/// SQLite-backed record store.
#[derive(Debug)]
pub struct RecordStore {
    conn: Connection,
    changes: ChangeFeed,
}

/// Context for a mutation operation, tracking side effects.
///
/// This struct is passed to mutation closures to:
/// - Record audit events for history
/// - Collect the change notifications published after commit
pub struct MutationContext {
    /// Name of the operation being performed.
    pub op_name: String,
    /// Actor performing the operation (device name, user, etc.).
    pub actor: String,
    /// Events to write at the end of the transaction.
    pub events: Vec<Event>,
    /// Changes to publish once the transaction has committed.
    pub changes: Vec<(i64, ChangeKind)>,
}

impl MutationContext {
    /// Create a new mutation context.
    #[must_use]
    pub fn new(op_name: &str, actor: &str) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor: actor.to_string(),
            events: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Record an audit event for a record.
    pub fn record_event(&mut self, record_id: i64, event_type: EventType, comment: Option<&str>) {
        let mut event = Event::new(RECORD_ENTITY, &record_id.to_string(), event_type, &self.actor);
        if let Some(comment) = comment {
            event = event.with_comment(comment);
        }
        self.events.push(event);
    }

    /// Record an event with old/new values for field tracking.
    pub fn record_change(
        &mut self,
        record_id: i64,
        event_type: EventType,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.events.push(
            Event::new(RECORD_ENTITY, &record_id.to_string(), event_type, &self.actor)
                .with_values(old_value, new_value),
        );
    }

    /// Queue a change notification for a record.
    pub fn touch(&mut self, record_id: i64, kind: ChangeKind) {
        self.changes.push((record_id, kind));
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<MonitoringRecord> {
    Ok(MonitoringRecord {
        id: Some(row.get(0)?),
        custom_id: row.get(1)?,
        data: RecordDraft {
            cave_name: row.get(2)?,
            person_in_charge: row.get(3)?,
            person_in_charge_other: row.get(4)?,
            diligenciamiento_date: row.get(5)?,
            active_drip: row.get(6)?,
            drip_count: row.get(7)?,
            test_tube_sample_name: row.get(8)?,
            watch_glass_sample_name: row.get(9)?,
            has_it_rained: row.get(10)?,
            watch_glass_fallen: row.get(11)?,
            observations: row.get(12)?,
            carbonate_observed: row.get(13)?,
            image: row.get(14)?,
        },
        synced: row.get(15)?,
    })
}

fn load_record(conn: &Connection, id: i64) -> Result<Option<MonitoringRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
            [id],
            map_record,
        )
        .optional()?;
    Ok(record)
}

fn query_records(conn: &Connection, sql: &str) -> Result<Vec<MonitoringRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map_record)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn count_where(conn: &Connection, condition: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM records WHERE {condition}"),
        [],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or_default())
}

fn map_receipt(row: &Row<'_>) -> rusqlite::Result<CommitReceipt> {
    Ok(CommitReceipt {
        record_id: row.get(0)?,
        custom_id: row.get(1)?,
        content_hash: row.get(2)?,
        committed_at: row.get(3)?,
    })
}

impl RecordStore {
    /// Open a database at the given path.
    ///
    /// Creates the database and applies schema if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a database with an optional busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema fails.
    pub fn open_with_timeout(path: &Path, timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;

        if let Some(timeout) = timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        } else {
            // Default 5 second timeout
            conn.busy_timeout(Duration::from_secs(5))?;
        }

        apply_schema(&conn)?;
        Ok(Self {
            conn,
            changes: ChangeFeed::new(),
        })
    }

    /// Open an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self {
            conn,
            changes: ChangeFeed::new(),
        })
    }

    /// Subscribe to changes committed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Execute a mutation with the transaction protocol.
    ///
    /// This method:
    /// 1. Begins an IMMEDIATE transaction (for write locking)
    /// 2. Executes the mutation closure
    /// 3. Writes audit events
    /// 4. Commits (or rolls back on error)
    /// 5. Publishes change notifications
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The transaction is rolled back on error
    /// and nothing is published.
    pub fn mutate<F, R>(&mut self, op: &str, actor: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let mut ctx = MutationContext::new(op, actor);

        let result = f(&tx, &mut ctx)?;

        for event in &ctx.events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        debug!(op = %ctx.op_name, actor = %ctx.actor, changes = ctx.changes.len(), "Committed");
        self.changes.publish(ctx.changes);

        Ok(result)
    }

    // ==================
    // Record Operations
    // ==================

    /// Persist a new record and return its id.
    ///
    /// The record gets a fresh `customId` and starts unsynced.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn add(&mut self, draft: &RecordDraft, actor: &str) -> Result<i64> {
        let now = chrono::Utc::now().timestamp_millis();
        let custom = custom_id(draft, now);

        self.mutate("add_record", actor, |tx, ctx| {
            tx.execute(
                "INSERT INTO records (custom_id, cave_name, person_in_charge, person_in_charge_other,
                     diligenciamiento_date, active_drip, drip_count, test_tube_sample_name,
                     watch_glass_sample_name, has_it_rained, watch_glass_fallen, observations,
                     carbonate_observed, image, synced, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, ?15, ?15)",
                rusqlite::params![
                    custom,
                    draft.cave_name,
                    draft.person_in_charge,
                    draft.person_in_charge_other,
                    draft.diligenciamiento_date,
                    draft.active_drip,
                    draft.drip_count,
                    draft.test_tube_sample_name,
                    draft.watch_glass_sample_name,
                    draft.has_it_rained,
                    draft.watch_glass_fallen,
                    draft.observations,
                    draft.carbonate_observed,
                    draft.image,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();

            ctx.record_event(id, EventType::RecordCreated, Some(&custom));
            ctx.touch(id, ChangeKind::Created);

            Ok(id)
        })
    }

    /// Merge a patch into a record.
    ///
    /// Any edit clears the sync flag and bumps the revision, even one that
    /// leaves the content as it was. `customId` never changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has this id.
    pub fn update(&mut self, id: i64, patch: &RecordPatch, actor: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        self.mutate("update_record", actor, |tx, ctx| {
            let mut record = load_record(tx, id)?.ok_or(Error::RecordNotFound { id })?;
            let was_synced = record.synced;
            patch.apply(&mut record.data);
            let data = &record.data;

            tx.execute(
                "UPDATE records SET cave_name = ?1, person_in_charge = ?2,
                     person_in_charge_other = ?3, diligenciamiento_date = ?4, active_drip = ?5,
                     drip_count = ?6, test_tube_sample_name = ?7, watch_glass_sample_name = ?8,
                     has_it_rained = ?9, watch_glass_fallen = ?10, observations = ?11,
                     carbonate_observed = ?12, image = ?13, synced = 0, updated_at = ?14,
                     revision = revision + 1
                 WHERE id = ?15",
                rusqlite::params![
                    data.cave_name,
                    data.person_in_charge,
                    data.person_in_charge_other,
                    data.diligenciamiento_date,
                    data.active_drip,
                    data.drip_count,
                    data.test_tube_sample_name,
                    data.watch_glass_sample_name,
                    data.has_it_rained,
                    data.watch_glass_fallen,
                    data.observations,
                    data.carbonate_observed,
                    data.image,
                    now,
                    id,
                ],
            )?;

            if was_synced {
                ctx.record_change(
                    id,
                    EventType::RecordUpdated,
                    Some("synced".to_string()),
                    Some("unsynced".to_string()),
                );
            } else {
                ctx.record_event(id, EventType::RecordUpdated, None);
            }
            ctx.touch(id, ChangeKind::Updated);

            Ok(())
        })
    }

    /// Permanently remove a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecordId`] for a missing, zero or negative id,
    /// and [`Error::RecordNotFound`] if no record has this id.
    pub fn delete(&mut self, id: Option<i64>, actor: &str) -> Result<()> {
        let id = id.filter(|id| *id > 0).ok_or(Error::InvalidRecordId)?;

        self.mutate("delete_record", actor, |tx, ctx| {
            let custom: Option<String> = tx
                .query_row("SELECT custom_id FROM records WHERE id = ?1", [id], |row| {
                    row.get(0)
                })
                .optional()?;
            let Some(custom) = custom else {
                return Err(Error::RecordNotFound { id });
            };

            tx.execute("DELETE FROM records WHERE id = ?1", [id])?;

            ctx.record_event(id, EventType::RecordDeleted, Some(&custom));
            ctx.touch(id, ChangeKind::Deleted);

            Ok(())
        })
    }

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] if no record has this id.
    pub fn get(&self, id: i64) -> Result<MonitoringRecord> {
        load_record(&self.conn, id)?.ok_or(Error::RecordNotFound { id })
    }

    /// All records, newest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list(&self) -> Result<Vec<MonitoringRecord>> {
        query_records(
            &self.conn,
            &format!("SELECT {RECORD_COLUMNS} FROM records ORDER BY id DESC"),
        )
    }

    /// Records awaiting sync, oldest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_unsynced(&self) -> Result<Vec<MonitoringRecord>> {
        query_records(
            &self.conn,
            &format!("SELECT {RECORD_COLUMNS} FROM records WHERE synced = 0 ORDER BY id ASC"),
        )
    }

    /// Edit counter of a record, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn revision(&self, id: i64) -> Result<Option<i64>> {
        let revision = self
            .conn
            .query_row("SELECT revision FROM records WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(revision)
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<usize> {
        count_where(&self.conn, "1 = 1")
    }

    /// Number of records awaiting sync.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn unsynced_count(&self) -> Result<usize> {
        count_where(&self.conn, "synced = 0")
    }

    /// Apply a remote commit receipt.
    ///
    /// The flag is only set if the record still exists, has not been edited
    /// since `revision` was read, and still hashes to what was committed. The
    /// receipt is stored in the same transaction as the flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub(crate) fn mark_synced(
        &mut self,
        receipt: &CommitReceipt,
        revision: i64,
        actor: &str,
    ) -> Result<MarkOutcome> {
        let id = receipt.record_id;

        self.mutate("mark_synced", actor, |tx, ctx| {
            let Some(current) = load_record(tx, id)? else {
                return Ok(MarkOutcome::Missing);
            };
            let current_revision: i64 =
                tx.query_row("SELECT revision FROM records WHERE id = ?1", [id], |row| {
                    row.get(0)
                })?;
            if current_revision != revision || record_hash(&current)? != receipt.content_hash {
                return Ok(MarkOutcome::Changed);
            }

            tx.execute("UPDATE records SET synced = 1 WHERE id = ?1", [id])?;
            tx.execute(
                "INSERT INTO remote_commits (record_id, custom_id, content_hash, committed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    id,
                    receipt.custom_id,
                    receipt.content_hash,
                    receipt.committed_at
                ],
            )?;

            ctx.record_event(id, EventType::RecordSynced, Some(&receipt.content_hash));
            ctx.touch(id, ChangeKind::Synced);

            Ok(MarkOutcome::Synced)
        })
    }

    /// Commit receipts for a record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn receipts(&self, record_id: i64) -> Result<Vec<CommitReceipt>> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, custom_id, content_hash, committed_at
             FROM remote_commits WHERE record_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([record_id], map_receipt)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The most recent commit receipt across all records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn last_commit(&self) -> Result<Option<CommitReceipt>> {
        let receipt = self
            .conn
            .query_row(
                "SELECT record_id, custom_id, content_hash, committed_at
                 FROM remote_commits ORDER BY id DESC LIMIT 1",
                [],
                map_receipt,
            )
            .optional()?;
        Ok(receipt)
    }

    /// Audit trail of a record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn events(&self, record_id: i64) -> Result<Vec<Event>> {
        Ok(get_events(&self.conn, RECORD_ENTITY, &record_id.to_string(), None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PERSON_OTHER;
    use tempfile::TempDir;

    const ACTOR: &str = "test-actor";

    fn draft(cave: &str) -> RecordDraft {
        RecordDraft {
            cave_name: cave.to_string(),
            person_in_charge: "Delsy Gamboa".to_string(),
            diligenciamiento_date: "2024-05-10".to_string(),
            active_drip: "5 segundos".to_string(),
            ..RecordDraft::default()
        }
    }

    fn receipt_for(store: &RecordStore, id: i64) -> CommitReceipt {
        let record = store.get(id).unwrap();
        CommitReceipt {
            record_id: id,
            custom_id: record.custom_id.clone(),
            content_hash: record_hash(&record).unwrap(),
            committed_at: 1_000,
        }
    }

    #[test]
    fn test_open_memory() {
        let store = RecordStore::open_memory();
        assert!(store.is_ok());
    }

    #[test]
    fn test_add_assigns_id_and_custom_id() {
        let mut store = RecordStore::open_memory().unwrap();

        let id = store.add(&draft("La Chapa"), ACTOR).unwrap();
        let record = store.get(id).unwrap();

        assert_eq!(record.id, Some(id));
        assert!(!record.synced);
        assert!(record.custom_id.starts_with("La_Chapa-2024-05-10-Delsy_Gamboa-"));
        let millis = record.custom_id.rsplit('-').next().unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
    }

    fn full_draft() -> RecordDraft {
        RecordDraft {
            cave_name: "Cueva del Esplendor".to_string(),
            person_in_charge: PERSON_OTHER.to_string(),
            person_in_charge_other: Some("Lina Restrepo".to_string()),
            diligenciamiento_date: "2024-07-21".to_string(),
            active_drip: "Sí".to_string(),
            drip_count: "12".to_string(),
            test_tube_sample_name: "TT-07".to_string(),
            watch_glass_sample_name: "VR-03".to_string(),
            has_it_rained: "No".to_string(),
            watch_glass_fallen: "Sí".to_string(),
            observations: "Goteo constante, \"fuerte\"\nsegunda línea".to_string(),
            carbonate_observed: "Poco".to_string(),
            image: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
        }
    }

    #[test]
    fn test_add_then_get_returns_every_field() {
        let mut store = RecordStore::open_memory().unwrap();
        let input = full_draft();

        let id = store.add(&input, ACTOR).unwrap();
        let record = store.get(id).unwrap();

        assert_eq!(record.data, input);
        assert_eq!(record.id, Some(id));
        assert!(!record.synced);
        assert!(record
            .custom_id
            .starts_with("Cueva_del_Esplendor-2024-07-21-Lina_Restrepo-"));
    }

    #[test]
    fn test_update_every_field_then_get() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&full_draft(), ACTOR).unwrap();
        let custom = store.get(id).unwrap().custom_id;

        let patch = RecordPatch {
            cave_name: Some("La Fábrica".to_string()),
            person_in_charge: Some("Delsy Gamboa".to_string()),
            person_in_charge_other: Some(None),
            diligenciamiento_date: Some("2024-08-02".to_string()),
            active_drip: Some("No".to_string()),
            drip_count: Some("0".to_string()),
            test_tube_sample_name: Some("TT-08".to_string()),
            watch_glass_sample_name: Some("VR-04".to_string()),
            has_it_rained: Some("Sí".to_string()),
            watch_glass_fallen: Some("No".to_string()),
            observations: Some("Seco".to_string()),
            carbonate_observed: Some("Abundante".to_string()),
            image: Some(Some("data:image/jpeg;base64,/9j/4AAQ".to_string())),
        };
        store.update(id, &patch, ACTOR).unwrap();

        let expected = RecordDraft {
            cave_name: "La Fábrica".to_string(),
            person_in_charge: "Delsy Gamboa".to_string(),
            person_in_charge_other: None,
            diligenciamiento_date: "2024-08-02".to_string(),
            active_drip: "No".to_string(),
            drip_count: "0".to_string(),
            test_tube_sample_name: "TT-08".to_string(),
            watch_glass_sample_name: "VR-04".to_string(),
            has_it_rained: "Sí".to_string(),
            watch_glass_fallen: "No".to_string(),
            observations: "Seco".to_string(),
            carbonate_observed: "Abundante".to_string(),
            image: Some("data:image/jpeg;base64,/9j/4AAQ".to_string()),
        };
        let record = store.get(id).unwrap();
        assert_eq!(record.data, expected);
        assert_eq!(record.custom_id, custom);
        assert!(!record.synced);
    }

    #[test]
    fn test_update_bumps_revision() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&draft("La Vaca"), ACTOR).unwrap();
        assert_eq!(store.revision(id).unwrap(), Some(0));

        store.update(id, &RecordPatch::default(), ACTOR).unwrap();
        store.update(id, &RecordPatch::default(), ACTOR).unwrap();

        assert_eq!(store.revision(id).unwrap(), Some(2));
        assert_eq!(store.revision(id + 1).unwrap(), None);
    }

    #[test]
    fn test_mark_synced_rejects_stale_revision_after_empty_edit() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&draft("El Santo"), ACTOR).unwrap();
        let revision = store.revision(id).unwrap().unwrap();
        let receipt = receipt_for(&store, id);

        // Same content, but edited after the revision was read.
        store.update(id, &RecordPatch::default(), ACTOR).unwrap();

        assert_eq!(
            store.mark_synced(&receipt, revision, ACTOR).unwrap(),
            MarkOutcome::Changed
        );
        assert!(!store.get(id).unwrap().synced);
        assert!(store.receipts(id).unwrap().is_empty());
    }

    #[test]
    fn test_add_keeps_other_person() {
        let mut store = RecordStore::open_memory().unwrap();
        let mut d = draft("Marlene");
        d.person_in_charge = PERSON_OTHER.to_string();
        d.person_in_charge_other = Some("Ana Ruiz".to_string());

        let id = store.add(&d, ACTOR).unwrap();
        let record = store.get(id).unwrap();

        assert_eq!(record.data.person_in_charge_other.as_deref(), Some("Ana Ruiz"));
        assert!(record.custom_id.contains("-Ana_Ruiz-"));
    }

    #[test]
    fn test_list_is_newest_first() {
        let mut store = RecordStore::open_memory().unwrap();
        let a = store.add(&draft("El Hoyo"), ACTOR).unwrap();
        let b = store.add(&draft("El Indio"), ACTOR).unwrap();
        let c = store.add(&draft("El Santo"), ACTOR).unwrap();

        let ids: Vec<i64> = store.list().unwrap().iter().map(MonitoringRecord::id_or_default).collect();
        assert_eq!(ids, vec![c, b, a]);

        let unsynced: Vec<i64> = store
            .list_unsynced()
            .unwrap()
            .iter()
            .map(MonitoringRecord::id_or_default)
            .collect();
        assert_eq!(unsynced, vec![a, b, c]);
    }

    #[test]
    fn test_update_merges_and_keeps_custom_id() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&draft("La Vaca"), ACTOR).unwrap();
        let before = store.get(id).unwrap();

        let patch = RecordPatch {
            cave_name: Some("Alsacia".to_string()),
            observations: Some("Goteo abundante".to_string()),
            ..RecordPatch::default()
        };
        store.update(id, &patch, ACTOR).unwrap();

        let after = store.get(id).unwrap();
        assert_eq!(after.data.cave_name, "Alsacia");
        assert_eq!(after.data.observations, "Goteo abundante");
        assert_eq!(after.data.active_drip, "5 segundos");
        assert_eq!(after.custom_id, before.custom_id);
    }

    #[test]
    fn test_update_clears_synced() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&draft("El Pesebre"), ACTOR).unwrap();

        let receipt = receipt_for(&store, id);
        assert_eq!(store.mark_synced(&receipt, 0, ACTOR).unwrap(), MarkOutcome::Synced);
        assert!(store.get(id).unwrap().synced);
        assert_eq!(store.unsynced_count().unwrap(), 0);

        store.update(id, &RecordPatch::default(), ACTOR).unwrap();
        assert!(!store.get(id).unwrap().synced);
        assert_eq!(store.unsynced_count().unwrap(), 1);
    }

    #[test]
    fn test_update_missing_record() {
        let mut store = RecordStore::open_memory().unwrap();
        let err = store.update(99, &RecordPatch::default(), ACTOR).unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { id: 99 }));
    }

    #[test]
    fn test_delete_and_ids_not_reused() {
        let mut store = RecordStore::open_memory().unwrap();
        let a = store.add(&draft("El Hoyo"), ACTOR).unwrap();
        let b = store.add(&draft("El Indio"), ACTOR).unwrap();

        store.delete(Some(b), ACTOR).unwrap();
        assert!(matches!(store.get(b), Err(Error::RecordNotFound { .. })));
        assert_eq!(store.count().unwrap(), 1);

        let c = store.add(&draft("Marlene"), ACTOR).unwrap();
        assert!(c > b && b > a);
    }

    #[test]
    fn test_delete_rejects_bad_ids() {
        let mut store = RecordStore::open_memory().unwrap();

        assert!(matches!(store.delete(None, ACTOR), Err(Error::InvalidRecordId)));
        assert!(matches!(store.delete(Some(0), ACTOR), Err(Error::InvalidRecordId)));
        assert!(matches!(store.delete(Some(-3), ACTOR), Err(Error::InvalidRecordId)));
        assert!(matches!(
            store.delete(Some(12), ACTOR),
            Err(Error::RecordNotFound { id: 12 })
        ));
    }

    #[test]
    fn test_mark_synced_skips_missing_and_changed() {
        let mut store = RecordStore::open_memory().unwrap();
        let gone = store.add(&draft("La Liona"), ACTOR).unwrap();
        let edited = store.add(&draft("La Perrita"), ACTOR).unwrap();

        let gone_receipt = receipt_for(&store, gone);
        let edited_receipt = receipt_for(&store, edited);

        store.delete(Some(gone), ACTOR).unwrap();
        store
            .update(
                edited,
                &RecordPatch {
                    drip_count: Some("30".to_string()),
                    ..RecordPatch::default()
                },
                ACTOR,
            )
            .unwrap();

        assert_eq!(store.mark_synced(&gone_receipt, 0, ACTOR).unwrap(), MarkOutcome::Missing);
        assert_eq!(store.mark_synced(&edited_receipt, 0, ACTOR).unwrap(), MarkOutcome::Changed);
        assert!(!store.get(edited).unwrap().synced);
        assert!(store.receipts(edited).unwrap().is_empty());
        assert!(store.last_commit().unwrap().is_none());
    }

    #[test]
    fn test_mark_synced_stores_receipt() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&draft("Cabeza de Toro"), ACTOR).unwrap();
        let receipt = receipt_for(&store, id);

        store.mark_synced(&receipt, 0, "sync").unwrap();

        assert_eq!(store.receipts(id).unwrap(), vec![receipt.clone()]);
        assert_eq!(store.last_commit().unwrap(), Some(receipt));
    }

    #[test]
    fn test_events_trace_lifecycle() {
        let mut store = RecordStore::open_memory().unwrap();
        let id = store.add(&draft("El Hoyo"), ACTOR).unwrap();
        store.mark_synced(&receipt_for(&store, id), 0, "sync").unwrap();
        store.update(id, &RecordPatch::default(), ACTOR).unwrap();
        store.delete(Some(id), ACTOR).unwrap();

        let kinds: Vec<EventType> = store.events(id).unwrap().iter().map(|e| e.event_type).collect();
        assert_eq!(
            kinds,
            vec![
                EventType::RecordCreated,
                EventType::RecordSynced,
                EventType::RecordUpdated,
                EventType::RecordDeleted,
            ]
        );

        let update = &store.events(id).unwrap()[2];
        assert_eq!(update.old_value.as_deref(), Some("synced"));
        assert_eq!(update.new_value.as_deref(), Some("unsynced"));
    }

    #[test]
    fn test_changes_arrive_in_commit_order() {
        let mut store = RecordStore::open_memory().unwrap();
        let mut rx = store.subscribe();

        let id = store.add(&draft("La Fábrica"), ACTOR).unwrap();
        store.update(id, &RecordPatch::default(), ACTOR).unwrap();
        let _ = store.update(999, &RecordPatch::default(), ACTOR);
        store.delete(Some(id), ACTOR).unwrap();

        let seen: Vec<StoreChange> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            seen,
            vec![
                StoreChange { sequence: 1, record_id: id, kind: ChangeKind::Created },
                StoreChange { sequence: 2, record_id: id, kind: ChangeKind::Updated },
                StoreChange { sequence: 3, record_id: id, kind: ChangeKind::Deleted },
            ]
        );
    }

    #[test]
    fn test_notified_subscriber_sees_committed_state() {
        let mut store = RecordStore::open_memory().unwrap();
        let mut rx = store.subscribe();

        let id = store.add(&draft("El Indio"), ACTOR).unwrap();
        let change = rx.try_recv().unwrap();

        assert_eq!(change.record_id, id);
        assert!(store.list().unwrap().iter().any(|r| r.id == Some(id)));
    }

    #[test]
    fn test_reopen_file_keeps_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cavemon.db");

        let id = {
            let mut store = RecordStore::open(&path).unwrap();
            store.add(&draft("El Santo"), ACTOR).unwrap()
        };

        let store = RecordStore::open_with_timeout(&path, Some(1_000)).unwrap();
        assert_eq!(store.get(id).unwrap().data.cave_name, "El Santo");
    }

    #[test]
    fn test_image_round_trips() {
        let mut store = RecordStore::open_memory().unwrap();
        let mut d = draft("Alsacia");
        d.image = Some("data:image/jpeg;base64,/9j/4AAQ".to_string());

        let id = store.add(&d, ACTOR).unwrap();
        assert_eq!(store.get(id).unwrap().data.image, d.image);

        store
            .update(
                id,
                &RecordPatch {
                    image: Some(None),
                    ..RecordPatch::default()
                },
                ACTOR,
            )
            .unwrap();
        assert_eq!(store.get(id).unwrap().data.image, None);
    }
}
