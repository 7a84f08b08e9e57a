//! The identifier export envelope.
//!
//! A portable JSON snapshot of one prefix's log: a key-state summary plus
//! every entry with its event, base64-encoded signatures, receipts, and
//! advisory timestamps. Importing re-appends the events in order, so the
//! envelope round-trips through the same validation as live traffic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use keri_kernel_core::{Event, KeyState};
use keri_kernel_store::LogEntry;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Version tag of the export envelope format.
pub const EXPORT_VERSION: &str = "1.0";

/// A portable snapshot of one identifier's log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierExport {
    /// Envelope format version, currently `"1.0"`.
    pub version: String,
    /// The identifier prefix.
    pub prefix: String,
    /// When the export was taken (RFC 3339 UTC).
    pub exported_at: DateTime<Utc>,
    /// Summary of the terminal key state.
    pub key_state: ExportedKeyState,
    /// All log entries in sequence order.
    pub events: Vec<ExportedEntry>,
}

/// Key-state summary carried in the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedKeyState {
    pub sequence: u64,
    pub keys: Vec<String>,
    pub threshold: u64,
    pub witnesses: Vec<String>,
    pub witness_threshold: u64,
}

impl From<&KeyState> for ExportedKeyState {
    fn from(state: &KeyState) -> Self {
        Self {
            sequence: state.sequence,
            keys: state.keys.clone(),
            threshold: state.threshold,
            witnesses: state.witnesses.clone(),
            witness_threshold: state.witness_threshold,
        }
    }
}

/// One log entry in the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub sequence: u64,
    pub event: Event,
    /// Standard-base64 encodings of the raw 64-byte signatures.
    pub signatures: Vec<String>,
    pub receipts: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

impl From<&LogEntry> for ExportedEntry {
    fn from(entry: &LogEntry) -> Self {
        Self {
            sequence: entry.sequence,
            event: entry.event.clone(),
            signatures: entry
                .signatures
                .iter()
                .map(|sig| STANDARD.encode(sig.as_bytes()))
                .collect(),
            receipts: entry.receipts.clone(),
            timestamp: entry.timestamp,
        }
    }
}
