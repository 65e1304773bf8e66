//! Content hashing for commit receipts.
//!
//! A receipt carries the SHA-256 of the record as committed. Comparing it
//! with a hash of the current row tells whether the record was edited while
//! its commit was in flight.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::model::MonitoringRecord;

/// Compute a SHA-256 hash of a serializable value.
///
/// The value is serialized to JSON first, then hashed.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn content_hash<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash of a record's committed content.
///
/// The sync flag is excluded so the hash is the same before and after the
/// record is marked synced.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized.
pub fn record_hash(record: &MonitoringRecord) -> Result<String> {
    content_hash(&(record.id, &record.custom_id, &record.data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordDraft;

    fn record() -> MonitoringRecord {
        MonitoringRecord {
            id: Some(1),
            custom_id: "El_Indio-2024-01-15-Leonardo_Forero-1".to_string(),
            data: RecordDraft {
                cave_name: "El Indio".to_string(),
                drip_count: "40".to_string(),
                ..RecordDraft::default()
            },
            synced: false,
        }
    }

    #[test]
    fn test_content_hash_deterministic() {
        let hash1 = content_hash(&record()).unwrap();
        let hash2 = content_hash(&record()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_record_hash_ignores_sync_flag() {
        let mut r = record();
        let before = record_hash(&r).unwrap();
        r.synced = true;
        assert_eq!(record_hash(&r).unwrap(), before);
    }

    #[test]
    fn test_record_hash_changes_with_content() {
        let mut r = record();
        let before = record_hash(&r).unwrap();
        r.data.drip_count = "41".to_string();
        assert_ne!(record_hash(&r).unwrap(), before);
    }
}
