//! Error types for the Key Event Log storage.

use thiserror::Error;

use keri_kernel_core::{CoreError, ValidationError};

/// Errors that can occur during log operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Structural or chain-level validation failure; storage is unmodified.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Encoding or cryptographic primitive failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A different event already occupies this (prefix, sequence).
    #[error("conflicting event at ({prefix}, {sequence}): existing digest {existing}")]
    Conflict {
        prefix: String,
        sequence: u64,
        existing: String,
    },

    /// The prefix has no entries.
    #[error("unknown prefix: {0}")]
    UnknownPrefix(String),

    /// No entry at the given position.
    #[error("no event at ({prefix}, {sequence})")]
    UnknownSequence { prefix: String, sequence: u64 },

    /// A stored entry failed to decode.
    #[error("corrupt entry at ({prefix}, {sequence}): {detail}")]
    Corrupt {
        prefix: String,
        sequence: u64,
        detail: String,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking storage task failed to complete.
    #[error("storage task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for log operations.
pub type Result<T> = std::result::Result<T, StoreError>;
