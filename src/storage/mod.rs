//! SQLite storage layer for cavemon.
//!
//! This module provides the persistence layer using SQLite with:
//! - WAL mode for concurrent reads
//! - Transaction discipline for atomic writes
//! - Audit events for history
//! - Change notifications after each commit
//!
//! # Submodules
//!
//! - [`changes`] - Broadcast of committed changes
//! - [`events`] - Audit event storage
//! - [`migrations`] - Additive schema migrations
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - The record store

pub mod changes;
pub mod events;
pub mod migrations;
pub mod schema;
pub mod sqlite;

pub use changes::{ChangeKind, StoreChange};
pub use sqlite::{MutationContext, RecordStore};
