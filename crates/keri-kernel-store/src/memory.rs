//! In-memory implementation of the `KelStore` trait.
//!
//! The canonical two-table layout from the concurrency model: entries keyed
//! by (prefix, sequence) and a head index keyed by prefix, both owned for the
//! life of the process behind a reader-writer lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use keri_kernel_core::{validate_chain_link, Event, Signature, ValidationError};

use crate::error::{Result, StoreError};
use crate::traits::{AppendResult, EventRange, KelStats, KelStore, LogEntry};

/// In-memory Key Event Log.
///
/// All data is lost when the log is dropped. Thread-safe via RwLock: writes
/// are exclusive, reads are shared.
pub struct MemoryKel {
    inner: RwLock<MemoryKelInner>,
}

struct MemoryKelInner {
    /// Entries keyed by (prefix, sequence); BTreeMap keeps range scans
    /// ordered.
    entries: BTreeMap<(String, u64), LogEntry>,

    /// Highest stored sequence per prefix.
    heads: HashMap<String, u64>,
}

impl MemoryKel {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryKelInner {
                entries: BTreeMap::new(),
                heads: HashMap::new(),
            }),
        }
    }
}

impl Default for MemoryKel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KelStore for MemoryKel {
    async fn append(
        &self,
        prefix: &str,
        event: Event,
        signatures: Vec<Signature>,
    ) -> Result<AppendResult> {
        let mut inner = self.inner.write().unwrap();

        if event.prefix() != prefix {
            return Err(StoreError::Validation(ValidationError::PrefixMismatch {
                expected: prefix.to_string(),
                got: event.prefix().to_string(),
            }));
        }

        let sequence = event.sequence().map_err(StoreError::Validation)?;
        let key = (prefix.to_string(), sequence);

        if let Some(existing) = inner.entries.get(&key) {
            if existing.event == event {
                return Ok(AppendResult::Duplicate);
            }
            return Err(StoreError::Conflict {
                prefix: prefix.to_string(),
                sequence,
                existing: existing.event.said().to_string(),
            });
        }

        let head = inner.heads.get(prefix).copied();
        let head_digest = head.and_then(|seq| {
            inner
                .entries
                .get(&(prefix.to_string(), seq))
                .map(|entry| entry.event.said().to_string())
        });
        let head_link = match (head, &head_digest) {
            (Some(seq), Some(digest)) => Some((seq, digest.as_str())),
            _ => None,
        };

        validate_chain_link(head_link, &event)?;

        inner.entries.insert(
            key,
            LogEntry {
                prefix: prefix.to_string(),
                sequence,
                event,
                signatures,
                receipts: Vec::new(),
                timestamp: Utc::now(),
            },
        );
        inner.heads.insert(prefix.to_string(), sequence);

        tracing::debug!(prefix, sequence, "event appended");
        Ok(AppendResult::Appended)
    }

    async fn events(&self, prefix: &str, range: EventRange) -> Result<Vec<LogEntry>> {
        let inner = self.inner.read().unwrap();

        let from = range.from.unwrap_or(0);
        let to = range.to.unwrap_or(u64::MAX);
        if from > to {
            return Ok(Vec::new());
        }

        let mut entries: Vec<LogEntry> = inner
            .entries
            .range((prefix.to_string(), from)..=(prefix.to_string(), to))
            .map(|(_, entry)| entry.clone())
            .collect();

        if let Some(limit) = range.limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    async fn event_at(&self, prefix: &str, sequence: u64) -> Result<Option<LogEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.entries.get(&(prefix.to_string(), sequence)).cloned())
    }

    async fn head(&self, prefix: &str) -> Result<Option<u64>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.heads.get(prefix).copied())
    }

    async fn add_receipts(&self, prefix: &str, sequence: u64, receipts: Vec<Value>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();

        let entry = inner
            .entries
            .get_mut(&(prefix.to_string(), sequence))
            .ok_or_else(|| StoreError::UnknownSequence {
                prefix: prefix.to_string(),
                sequence,
            })?;

        for receipt in receipts {
            if !entry.receipts.contains(&receipt) {
                entry.receipts.push(receipt);
            }
        }
        Ok(())
    }

    async fn clear(&self, prefix: &str) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.entries.retain(|(p, _), _| p != prefix);
        inner.heads.remove(prefix);
        tracing::debug!(prefix, "prefix cleared");
        Ok(())
    }

    async fn stats(&self) -> Result<KelStats> {
        let inner = self.inner.read().unwrap();

        let approximate_bytes = inner
            .entries
            .values()
            .map(|entry| {
                let event_bytes = entry
                    .event
                    .canonical_bytes()
                    .map(|b| b.len())
                    .unwrap_or(0);
                event_bytes + entry.signatures.len() * 64
            })
            .sum();

        Ok(KelStats {
            total_prefixes: inner.heads.len(),
            total_events: inner.entries.len(),
            approximate_bytes,
        })
    }
}
