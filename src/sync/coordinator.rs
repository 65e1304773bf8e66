//! Sync coordinator.
//!
//! Pushes every unsynced record to a [`RemoteCommit`] and flags each one
//! synced as soon as its commit is confirmed. A run:
//!
//! 1. Refuses to start while another run is active
//! 2. Refuses to start offline, touching no record
//! 3. Snapshots unsynced records (oldest first)
//! 4. Commits them one by one, persisting each flag immediately
//!
//! A record the remote rejects is reported and the run moves on. Records
//! already flagged are never rolled back. Only a local store failure aborts
//! the run early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::storage::RecordStore;
use crate::sync::network::Reachability;
use crate::sync::remote::RemoteCommit;
use crate::sync::types::{MarkOutcome, SyncFailure, SyncReport, SyncState};

/// Releases the single-run flag when a run ends or its future is dropped.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives sync runs against one store.
pub struct SyncCoordinator<R: RemoteCommit> {
    store: Arc<Mutex<RecordStore>>,
    remote: R,
    reachability: Reachability,
    actor: String,
    running: AtomicBool,
    state: Mutex<SyncState>,
}

impl<R: RemoteCommit> SyncCoordinator<R> {
    #[must_use]
    pub fn new(
        store: Arc<Mutex<RecordStore>>,
        remote: R,
        reachability: Reachability,
        actor: &str,
    ) -> Self {
        Self {
            store,
            remote,
            reachability,
            actor: actor.to_string(),
            running: AtomicBool::new(false),
            state: Mutex::new(SyncState::Idle),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.state.lock().map_or(SyncState::Failed, |s| *s)
    }

    fn set_state(&self, state: SyncState) {
        if let Ok(mut current) = self.state.lock() {
            *current = state;
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, RecordStore>> {
        self.store
            .lock()
            .map_err(|_| Error::Other("record store lock poisoned".to_string()))
    }

    /// Run one sync pass.
    ///
    /// Returns the report even when some records were rejected; check
    /// [`SyncReport::is_success`].
    ///
    /// # Errors
    ///
    /// - [`Error::SyncInProgress`] if a run is already active
    /// - [`Error::Offline`] if the network is unreachable
    /// - [`Error::SyncRun`] if the local store fails mid-run
    pub async fn run(&self) -> Result<SyncReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(Error::SyncInProgress);
        }
        let _guard = RunGuard(&self.running);

        if !self.reachability.is_online().await {
            warn!("Network unreachable, sync not started");
            return Err(Error::Offline);
        }

        let snapshot = self.store()?.list_unsynced()?;
        let mut report = SyncReport {
            total: snapshot.len(),
            ..SyncReport::default()
        };
        if snapshot.is_empty() {
            info!("Nothing to sync");
            return Ok(report);
        }

        self.set_state(SyncState::Syncing);
        info!(total = report.total, remote = self.remote.name(), "Sync started");

        for record in &snapshot {
            let id = record.id_or_default();

            // Any edit after this point, even an empty one, keeps the flag off.
            let revision = match self.store().and_then(|store| store.revision(id)) {
                Ok(Some(revision)) => revision,
                Ok(None) => {
                    info!(record = id, "Record deleted during sync, skipped");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(self.abort(&report, &e)),
            };

            let receipt = match self.remote.commit(record).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    warn!(record = id, error = %e, "Commit rejected");
                    report.failures.push(SyncFailure {
                        record_id: id,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let outcome = self
                .store()
                .and_then(|mut store| store.mark_synced(&receipt, revision, &self.actor));
            match outcome {
                Ok(MarkOutcome::Synced) => report.succeeded += 1,
                Ok(MarkOutcome::Missing | MarkOutcome::Changed) => {
                    info!(record = id, "Record changed during sync, left queued");
                    report.skipped += 1;
                }
                Err(e) => return Err(self.abort(&report, &e)),
            }
        }

        let state = report.final_state();
        self.set_state(state);
        info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            skipped = report.skipped,
            state = state.as_str(),
            "Sync finished"
        );

        Ok(report)
    }

    fn abort(&self, report: &SyncReport, cause: &Error) -> Error {
        warn!(error = %cause, succeeded = report.succeeded, "Sync aborted");
        self.set_state(SyncState::Failed);
        Error::SyncRun {
            succeeded: report.succeeded,
            total: report.total,
            message: cause.to_string(),
        }
    }
}
