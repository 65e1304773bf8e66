//! Record sync.
//!
//! Local records are pushed to a remote endpoint and flagged synced one by
//! one as each commit is confirmed:
//!
//! - **Coordinator**: single-run guard, offline check, sequential commits
//! - **Remote**: the commit endpoint trait and its simulated implementation
//! - **Network**: reachability check before a run
//! - **Hashing**: SHA-256 content hashes carried by commit receipts
//! - **Status**: counts of synced and pending records
//!
//! # Example
//!
//! ```ignore
//! use cavemon::sync::{Reachability, SimulatedRemote, SyncCoordinator};
//!
//! let coordinator = SyncCoordinator::new(store, SimulatedRemote::default(), Reachability::Forced(true), "tablet");
//! let report = coordinator.run().await?;
//! println!("{} of {} synced", report.succeeded, report.total);
//! ```

mod coordinator;
mod hash;
mod network;
mod remote;
mod status;
mod types;

pub use coordinator::SyncCoordinator;
pub use hash::{content_hash, record_hash};
pub use network::{Reachability, DEFAULT_PROBE_TIMEOUT};
pub use remote::{receipt_for, RemoteCommit, SimulatedRemote};
pub use status::{get_sync_status, print_status};
pub use types::{CommitReceipt, MarkOutcome, SyncFailure, SyncReport, SyncState, SyncStatus};
