//! Remote commit endpoint.
//!
//! There is no real backend. [`SimulatedRemote`] stands in for one: it
//! waits a fixed latency per record and returns a receipt carrying the
//! record's content hash.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::MonitoringRecord;
use crate::sync::hash::record_hash;
use crate::sync::types::CommitReceipt;

/// A destination that accepts records one at a time.
pub trait RemoteCommit: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Commit one record, returning proof of acceptance.
    fn commit(
        &self,
        record: &MonitoringRecord,
    ) -> impl Future<Output = Result<CommitReceipt>> + Send;
}

/// Build the receipt for a record committed at `committed_at` (Unix millis).
///
/// # Errors
///
/// Returns [`Error::InvalidRecordId`] for a record that was never stored.
pub fn receipt_for(record: &MonitoringRecord, committed_at: i64) -> Result<CommitReceipt> {
    let record_id = record.id.ok_or(Error::InvalidRecordId)?;
    Ok(CommitReceipt {
        record_id,
        custom_id: record.custom_id.clone(),
        content_hash: record_hash(record)?,
        committed_at,
    })
}

/// Local stand-in for a sync backend.
#[derive(Debug, Clone)]
pub struct SimulatedRemote {
    latency: Duration,
}

impl SimulatedRemote {
    /// Per-record latency used when none is configured.
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(250);

    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }

    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedRemote {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

impl RemoteCommit for SimulatedRemote {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn commit(&self, record: &MonitoringRecord) -> Result<CommitReceipt> {
        tokio::time::sleep(self.latency).await;

        let receipt = receipt_for(record, chrono::Utc::now().timestamp_millis())?;
        debug!(
            record = receipt.record_id,
            hash = %receipt.content_hash,
            "Simulated commit accepted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordDraft;

    fn record(id: Option<i64>) -> MonitoringRecord {
        MonitoringRecord {
            id,
            custom_id: "La_Fábrica-2024-03-01-Nicolas_Peña-5".to_string(),
            data: RecordDraft {
                cave_name: "La Fábrica".to_string(),
                ..RecordDraft::default()
            },
            synced: false,
        }
    }

    #[tokio::test]
    async fn test_simulated_commit_returns_hash_receipt() {
        let remote = SimulatedRemote::new(Duration::from_millis(1));
        let r = record(Some(5));

        let receipt = remote.commit(&r).await.unwrap();

        assert_eq!(receipt.record_id, 5);
        assert_eq!(receipt.custom_id, r.custom_id);
        assert_eq!(receipt.content_hash, record_hash(&r).unwrap());
        assert!(receipt.committed_at > 0);
    }

    #[tokio::test]
    async fn test_unsaved_record_is_rejected() {
        let remote = SimulatedRemote::new(Duration::ZERO);
        let err = remote.commit(&record(None)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRecordId));
    }

    #[test]
    fn test_default_latency() {
        assert_eq!(SimulatedRemote::default().latency(), Duration::from_millis(250));
    }
}
