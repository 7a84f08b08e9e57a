//! SQLite implementation of the `KelStore` trait.
//!
//! Durable backend using rusqlite with bundled SQLite. The connection sits
//! behind a mutex (exclusive writes, serialized reads) and every operation
//! runs under `spawn_blocking` so the async runtime is never blocked.
//!
//! Events are stored as their canonical JSON text, so the idempotency check
//! compares exactly the bytes that were signed and digested.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use keri_kernel_core::{validate_chain_link, CoreError, Event, Signature, ValidationError};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{AppendResult, EventRange, KelStats, KelStore, LogEntry};

/// SQLite-backed Key Event Log.
pub struct SqliteKel {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKel {
    /// Open a database at the given path, creating it and running migrations
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database. Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::Task("connection lock poisoned".to_string()))
}

fn join_err(e: tokio::task::JoinError) -> StoreError {
    StoreError::Task(e.to_string())
}

fn encode_signatures(signatures: &[Signature]) -> Result<String> {
    let encoded: Vec<String> = signatures
        .iter()
        .map(|sig| STANDARD.encode(sig.as_bytes()))
        .collect();
    serde_json::to_string(&encoded).map_err(|e| CoreError::Serialization(e.to_string()).into())
}

fn decode_row(
    prefix: &str,
    sequence: u64,
    event_json: &str,
    signatures_json: &str,
    receipts_json: &str,
    inserted_at: &str,
) -> Result<LogEntry> {
    let corrupt = |detail: String| StoreError::Corrupt {
        prefix: prefix.to_string(),
        sequence,
        detail,
    };

    let event = Event::from_bytes(event_json.as_bytes()).map_err(|e| corrupt(e.to_string()))?;

    let encoded: Vec<String> =
        serde_json::from_str(signatures_json).map_err(|e| corrupt(e.to_string()))?;
    let mut signatures = Vec::with_capacity(encoded.len());
    for sig in &encoded {
        let bytes = STANDARD.decode(sig).map_err(|e| corrupt(e.to_string()))?;
        signatures.push(Signature::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?);
    }

    let receipts: Vec<Value> =
        serde_json::from_str(receipts_json).map_err(|e| corrupt(e.to_string()))?;

    let timestamp = DateTime::parse_from_rfc3339(inserted_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);

    Ok(LogEntry {
        prefix: prefix.to_string(),
        sequence,
        event,
        signatures,
        receipts,
        timestamp,
    })
}

#[async_trait]
impl KelStore for SqliteKel {
    async fn append(
        &self,
        prefix: &str,
        event: Event,
        signatures: Vec<Signature>,
    ) -> Result<AppendResult> {
        let prefix = prefix.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            if event.prefix() != prefix {
                return Err(StoreError::Validation(ValidationError::PrefixMismatch {
                    expected: prefix,
                    got: event.prefix().to_string(),
                }));
            }
            let sequence = event.sequence().map_err(StoreError::Validation)?;
            let canonical = String::from_utf8(event.canonical_bytes()?)
                .map_err(|e| CoreError::Serialization(e.to_string()))?;

            let mut guard = lock(&conn)?;
            let tx = guard.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT event FROM events WHERE prefix = ?1 AND seq = ?2",
                    params![prefix, sequence as i64],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing) = existing {
                if existing == canonical {
                    return Ok(AppendResult::Duplicate);
                }
                let said = Event::from_bytes(existing.as_bytes())
                    .map(|e| e.said().to_string())
                    .unwrap_or_default();
                return Err(StoreError::Conflict {
                    prefix,
                    sequence,
                    existing: said,
                });
            }

            let head: Option<i64> = tx
                .query_row(
                    "SELECT head_seq FROM heads WHERE prefix = ?1",
                    params![prefix],
                    |row| row.get(0),
                )
                .optional()?;

            let head_digest: Option<String> = match head {
                Some(head_seq) => tx
                    .query_row(
                        "SELECT event FROM events WHERE prefix = ?1 AND seq = ?2",
                        params![prefix, head_seq],
                        |row| row.get(0),
                    )
                    .optional()?
                    .and_then(|json: String| {
                        Event::from_bytes(json.as_bytes())
                            .ok()
                            .map(|e| e.said().to_string())
                    }),
                None => None,
            };

            let head_link = match (head, &head_digest) {
                (Some(head_seq), Some(digest)) => Some((head_seq as u64, digest.as_str())),
                _ => None,
            };

            validate_chain_link(head_link, &event)?;

            tx.execute(
                "INSERT INTO events (prefix, seq, event, signatures, receipts, inserted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    prefix,
                    sequence as i64,
                    canonical,
                    encode_signatures(&signatures)?,
                    "[]",
                    Utc::now().to_rfc3339(),
                ],
            )?;
            tx.execute(
                "INSERT INTO heads (prefix, head_seq) VALUES (?1, ?2)
                 ON CONFLICT(prefix) DO UPDATE SET head_seq = excluded.head_seq",
                params![prefix, sequence as i64],
            )?;
            tx.commit()?;

            tracing::debug!(%prefix, sequence, "event appended");
            Ok(AppendResult::Appended)
        })
        .await
        .map_err(join_err)?
    }

    async fn events(&self, prefix: &str, range: EventRange) -> Result<Vec<LogEntry>> {
        let prefix = prefix.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;

            let from = range.from.unwrap_or(0) as i64;
            let to = range.to.map_or(i64::MAX, |t| t.min(i64::MAX as u64) as i64);
            let limit = range.limit.map_or(-1i64, |l| l as i64);

            let mut stmt = guard.prepare(
                "SELECT seq, event, signatures, receipts, inserted_at FROM events
                 WHERE prefix = ?1 AND seq >= ?2 AND seq <= ?3
                 ORDER BY seq LIMIT ?4",
            )?;

            let rows = stmt
                .query_map(params![prefix, from, to, limit], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut entries = Vec::with_capacity(rows.len());
            for (seq, event, sigs, receipts, at) in rows {
                entries.push(decode_row(&prefix, seq as u64, &event, &sigs, &receipts, &at)?);
            }
            Ok(entries)
        })
        .await
        .map_err(join_err)?
    }

    async fn event_at(&self, prefix: &str, sequence: u64) -> Result<Option<LogEntry>> {
        let prefix = prefix.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;

            let row: Option<(String, String, String, String)> = guard
                .query_row(
                    "SELECT event, signatures, receipts, inserted_at FROM events
                     WHERE prefix = ?1 AND seq = ?2",
                    params![prefix, sequence as i64],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?;

            match row {
                Some((event, sigs, receipts, at)) => Ok(Some(decode_row(
                    &prefix, sequence, &event, &sigs, &receipts, &at,
                )?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(join_err)?
    }

    async fn head(&self, prefix: &str) -> Result<Option<u64>> {
        let prefix = prefix.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            let head: Option<i64> = guard
                .query_row(
                    "SELECT head_seq FROM heads WHERE prefix = ?1",
                    params![prefix],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(head.map(|h| h as u64))
        })
        .await
        .map_err(join_err)?
    }

    async fn add_receipts(&self, prefix: &str, sequence: u64, receipts: Vec<Value>) -> Result<()> {
        let prefix = prefix.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;

            let current: Option<String> = guard
                .query_row(
                    "SELECT receipts FROM events WHERE prefix = ?1 AND seq = ?2",
                    params![prefix, sequence as i64],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(current) = current else {
                return Err(StoreError::UnknownSequence { prefix, sequence });
            };

            let mut list: Vec<Value> =
                serde_json::from_str(&current).map_err(|e| StoreError::Corrupt {
                    prefix: prefix.clone(),
                    sequence,
                    detail: e.to_string(),
                })?;
            for receipt in receipts {
                if !list.contains(&receipt) {
                    list.push(receipt);
                }
            }

            let updated = serde_json::to_string(&list)
                .map_err(|e| CoreError::Serialization(e.to_string()))?;
            guard.execute(
                "UPDATE events SET receipts = ?3 WHERE prefix = ?1 AND seq = ?2",
                params![prefix, sequence as i64, updated],
            )?;
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn clear(&self, prefix: &str) -> Result<()> {
        let prefix = prefix.to_string();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&conn)?;
            let tx = guard.transaction()?;
            tx.execute("DELETE FROM events WHERE prefix = ?1", params![prefix])?;
            tx.execute("DELETE FROM heads WHERE prefix = ?1", params![prefix])?;
            tx.commit()?;

            tracing::debug!(%prefix, "prefix cleared");
            Ok(())
        })
        .await
        .map_err(join_err)?
    }

    async fn stats(&self) -> Result<KelStats> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;

            let total_prefixes: i64 =
                guard.query_row("SELECT COUNT(*) FROM heads", [], |row| row.get(0))?;
            let (total_events, approximate_bytes): (i64, i64) = guard.query_row(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(event)), 0) FROM events",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(KelStats {
                total_prefixes: total_prefixes as usize,
                total_events: total_events as usize,
                approximate_bytes: approximate_bytes as usize,
            })
        })
        .await
        .map_err(join_err)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keri_kernel_core::{
        next_key_commitment, Inception, InceptionBuilder, InteractionBuilder, Signer,
    };

    fn make_inception() -> (Signer, Inception) {
        let signer = Signer::from_seed([0x21; 32], true);
        let next = Signer::from_seed([0x22; 32], true);
        let event = InceptionBuilder::new(
            vec![signer.verfer().qb64()],
            next_key_commitment(&[next.verfer().qb64()], 1),
        )
        .build()
        .unwrap();
        (signer, event)
    }

    fn sign(signer: &Signer, event: &Event) -> Vec<Signature> {
        vec![signer.sign(&event.canonical_bytes().unwrap())]
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);

        let result = kel
            .append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();
        assert_eq!(result, AppendResult::Appended);

        let entry = kel.event_at(&prefix, 0).await.unwrap().unwrap();
        assert_eq!(entry.event, event);
        assert_eq!(entry.signatures.len(), 1);
        assert_eq!(kel.head(&prefix).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_idempotent_append() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);

        kel.append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();
        let second = kel
            .append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();
        assert_eq!(second, AppendResult::Duplicate);
    }

    #[tokio::test]
    async fn test_conflict_detection() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);
        kel.append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();

        let ixn = InteractionBuilder::new(&prefix, 1, event.said())
            .build()
            .unwrap();
        kel.append(&prefix, Event::Interaction(ixn), Vec::new())
            .await
            .unwrap();

        let other = InteractionBuilder::new(&prefix, 1, event.said())
            .anchors(vec![serde_json::json!({"i": "y", "s": "0", "d": "E"})])
            .build()
            .unwrap();
        let result = kel
            .append(&prefix, Event::Interaction(other), Vec::new())
            .await;
        assert!(matches!(result, Err(StoreError::Conflict { sequence: 1, .. })));
    }

    #[tokio::test]
    async fn test_chain_rules_enforced() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);
        kel.append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();

        // Skipping a sequence is refused and leaves the head untouched.
        let skipped = InteractionBuilder::new(&prefix, 2, event.said())
            .build()
            .unwrap();
        let result = kel
            .append(&prefix, Event::Interaction(skipped), Vec::new())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Validation(
                ValidationError::SequenceOutOfOrder { .. }
            ))
        ));
        assert_eq!(kel.head(&prefix).await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_events_range() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let mut prior = inception.said.clone();
        let event = Event::Inception(inception);
        kel.append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();

        for seq in 1..=3 {
            let ixn = InteractionBuilder::new(&prefix, seq, &prior).build().unwrap();
            prior = ixn.said.clone();
            kel.append(&prefix, Event::Interaction(ixn), Vec::new())
                .await
                .unwrap();
        }

        let all = kel.events(&prefix, EventRange::default()).await.unwrap();
        let seqs: Vec<u64> = all.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);

        let window = kel
            .events(
                &prefix,
                EventRange {
                    from: Some(1),
                    to: None,
                    limit: Some(2),
                },
            )
            .await
            .unwrap();
        let seqs: Vec<u64> = window.iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_receipts_roundtrip() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);
        kel.append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();

        let receipt = serde_json::json!({"witness": "w1"});
        kel.add_receipts(&prefix, 0, vec![receipt.clone(), receipt.clone()])
            .await
            .unwrap();

        let entry = kel.event_at(&prefix, 0).await.unwrap().unwrap();
        assert_eq!(entry.receipts, vec![receipt]);
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let kel = SqliteKel::open_memory().unwrap();
        let (signer, inception) = make_inception();
        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);
        kel.append(&prefix, event.clone(), sign(&signer, &event))
            .await
            .unwrap();

        let stats = kel.stats().await.unwrap();
        assert_eq!(stats.total_prefixes, 1);
        assert_eq!(stats.total_events, 1);
        assert!(stats.approximate_bytes > 0);

        kel.clear(&prefix).await.unwrap();
        assert_eq!(kel.head(&prefix).await.unwrap(), None);
        assert_eq!(kel.stats().await.unwrap(), KelStats::default());
    }
}
