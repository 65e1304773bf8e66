//! Type definitions for sync operations.

use serde::{Deserialize, Serialize};

/// Lifecycle of the sync coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Completed,
    Failed,
}

impl SyncState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Syncing => "syncing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Proof that the remote accepted one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub record_id: i64,
    pub custom_id: String,
    /// SHA-256 of the record content that was committed.
    pub content_hash: String,
    /// Unix milliseconds.
    pub committed_at: i64,
}

/// What happened when a receipt was applied to the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    /// The record's flag was set.
    Synced,
    /// The record was deleted after the run started.
    Missing,
    /// The record was edited after the run started; it stays queued.
    Changed,
}

/// A record the remote rejected during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub record_id: i64,
    pub message: String,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Records in the snapshot taken when the run started.
    pub total: usize,
    /// Records committed and flagged synced.
    pub succeeded: usize,
    /// Records deleted or edited between the snapshot and their commit.
    pub skipped: usize,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when no record was rejected.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Final coordinator state for this report.
    #[must_use]
    pub fn final_state(&self) -> SyncState {
        if self.is_success() {
            SyncState::Completed
        } else {
            SyncState::Failed
        }
    }
}

/// Counts shown by `cavemon status`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub total_records: usize,
    pub unsynced_records: usize,
    pub synced_records: usize,
    /// Unix milliseconds of the most recent remote commit.
    pub last_commit_at: Option<i64>,
}
