//! # KERI Kernel
//!
//! A self-certifying identifier engine built around an append-only,
//! cryptographically chained Key Event Log.
//!
//! Given Ed25519 keypairs, the kernel creates autonomic identifiers by
//! inception, rotates signing keys against pre-rotation commitments, anchors
//! external data via interaction events, and reconstructs a current key
//! state by deterministic replay of the log. Every event is self-addressing:
//! its identifier is the BLAKE3-256 digest of its own canonical
//! serialization, and an identifier's prefix is the digest of its inception
//! event.
//!
//! ## Example
//!
//! ```no_run
//! use keri_kernel::{InceptOpts, Kernel};
//! use keri_kernel_core::Signer;
//!
//! # async fn example() -> Result<(), keri_kernel::KernelError> {
//! let kernel = Kernel::in_memory();
//!
//! let signer = Signer::new_random(true);
//! let next_signer = Signer::new_random(true);
//!
//! let aid = kernel
//!     .create_identifier(&signer, &next_signer, InceptOpts::default())
//!     .await?;
//! assert!(aid.prefix.starts_with('E'));
//!
//! kernel.verify_identifier(&aid.prefix).await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod export;
mod kernel;

pub use error::{KernelError, Result};
pub use export::{ExportedEntry, ExportedKeyState, IdentifierExport, EXPORT_VERSION};
pub use kernel::{Aid, InceptOpts, Kernel, RotateOpts};

pub use keri_kernel_core as core;
pub use keri_kernel_store as store;
