//! Change notifications for committed mutations.
//!
//! The store publishes one [`StoreChange`] per affected record after each
//! transaction commits, in commit order. A subscriber that re-reads the
//! store on notification always sees the committed state.

use tokio::sync::broadcast;

/// Buffered notifications per subscriber before the oldest are dropped.
pub const CHANNEL_CAPACITY: usize = 64;

/// Type of change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// The sync flag flipped to true after a confirmed remote commit.
    Synced,
}

/// A committed change to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChange {
    /// Monotonically increasing per store.
    pub sequence: u64,
    pub record_id: i64,
    pub kind: ChangeKind,
}

/// Distributes committed changes to subscribers.
#[derive(Debug)]
pub struct ChangeFeed {
    sender: broadcast::Sender<StoreChange>,
    sequence: u64,
}

impl ChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            sequence: 0,
        }
    }

    /// Subscribe to changes committed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }

    /// Publish changes in order. Having no subscribers is not an error.
    pub fn publish(&mut self, changes: impl IntoIterator<Item = (i64, ChangeKind)>) {
        for (record_id, kind) in changes {
            self.sequence += 1;
            let _ = self.sender.send(StoreChange {
                sequence: self.sequence,
                record_id,
                kind,
            });
        }
    }

    /// Sequence number of the last published change.
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.sequence
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
