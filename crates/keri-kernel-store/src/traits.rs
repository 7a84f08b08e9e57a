//! The `KelStore` trait: the abstract interface for Key Event Log storage.
//!
//! The trait allows the kernel facade to be storage-agnostic. Implementations
//! are [`MemoryKel`](crate::MemoryKel) (process-lifetime tables) and
//! [`SqliteKel`](crate::SqliteKel) (durable).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use keri_kernel_core::{Event, Signature};

use crate::error::Result;

/// A single entry in a Key Event Log.
///
/// Entries never mutate after insertion, except that receipts may be
/// appended.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// The identifier prefix this entry belongs to.
    pub prefix: String,
    /// Sequence number within the log (0-indexed).
    pub sequence: u64,
    /// The key event itself.
    pub event: Event,
    /// Raw Ed25519 signatures over the event's canonical serialization.
    pub signatures: Vec<Signature>,
    /// Witness receipts. Stored opaquely, never verified.
    pub receipts: Vec<Value>,
    /// Local insertion time. Advisory only.
    pub timestamp: DateTime<Utc>,
}

/// Result of appending an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendResult {
    /// The event was new and is now stored.
    Appended,
    /// The identical event was already stored (idempotent - not an error).
    Duplicate,
}

/// Range selection for event queries. Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventRange {
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub limit: Option<usize>,
}

/// Aggregate counters for a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KelStats {
    pub total_prefixes: usize,
    pub total_events: usize,
    pub approximate_bytes: usize,
}

/// The Key Event Log: async interface for event storage.
///
/// # Design Notes
///
/// - **Single-writer discipline**: mutating operations (`append`,
///   `add_receipts`, `clear`) are serialized; reads may run concurrently and
///   observe some past serialized write.
/// - **Idempotent appends**: re-appending an identical event returns
///   [`AppendResult::Duplicate`].
/// - **Conflict refusal**: a different event at an occupied position is a
///   [`StoreError::Conflict`](crate::StoreError::Conflict) and leaves the log
///   unchanged.
/// - **Gatekeeping**: every append runs the chain-link validation from
///   `keri_kernel_core::validate_chain_link`; rejected events never touch
///   storage.
#[async_trait]
pub trait KelStore: Send + Sync {
    /// Validate an event against the prefix's current head and insert it.
    async fn append(
        &self,
        prefix: &str,
        event: Event,
        signatures: Vec<Signature>,
    ) -> Result<AppendResult>;

    /// Ordered entries for a prefix, filtered by the inclusive range.
    ///
    /// An unknown prefix yields an empty list.
    async fn events(&self, prefix: &str, range: EventRange) -> Result<Vec<LogEntry>>;

    /// Single entry at a position.
    async fn event_at(&self, prefix: &str, sequence: u64) -> Result<Option<LogEntry>>;

    /// Highest stored sequence for a prefix, `None` when unknown.
    async fn head(&self, prefix: &str) -> Result<Option<u64>>;

    /// Append receipts to an existing entry, deduplicating by value.
    async fn add_receipts(&self, prefix: &str, sequence: u64, receipts: Vec<Value>) -> Result<()>;

    /// Destructively remove all entries and the head index for a prefix.
    async fn clear(&self, prefix: &str) -> Result<()>;

    /// Aggregate counters over the whole log.
    async fn stats(&self) -> Result<KelStats>;
}
