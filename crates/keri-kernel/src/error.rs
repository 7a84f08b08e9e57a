//! Error types for the kernel facade.

use thiserror::Error;

use keri_kernel_core::{CoreError, ValidationError};
use keri_kernel_store::StoreError;

/// Errors surfaced by kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown prefix: {0}")]
    UnknownPrefix(String),

    #[error("identifier is establishment-only; interactions are refused")]
    EstablishmentOnly,

    #[error("unsupported export version: {0}")]
    UnsupportedExportVersion(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
