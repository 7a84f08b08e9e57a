//! # KERI Kernel Core
//!
//! Pure primitives for the KERI kernel: CESR encoding, BLAKE3 digests,
//! Ed25519 keys, key events, and key-state replay.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Matter`] - A (code, raw-bytes) CESR primitive and its qb64 text form
//! - [`Diger`] - BLAKE3-256 digest with the `E` derivation code
//! - [`Signer`] / [`Verfer`] - Ed25519 keypair halves with CESR codes
//! - [`Event`] - Inception, rotation, and interaction key events
//! - [`KeyState`] - The fold of an identifier's event log
//!
//! ## Canonical serialization
//!
//! Events serialize to compact JSON in a fixed field order; that form is
//! digested to produce the self-addressing identifier and is what gets
//! signed. See the [`event`] module.

pub mod cesr;
pub mod digest;
pub mod error;
pub mod event;
pub mod keys;
pub mod state;
pub mod validation;

pub use cesr::{codes, extract_code, sizage, Matter, Sizage};
pub use digest::Diger;
pub use error::{CoreError, ValidationError};
pub use event::{
    deversify, encode_threshold, next_key_commitment, parse_seq, parse_threshold, seq_to_hex,
    versify, Event, Ilk, Inception, InceptionBuilder, Interaction, InteractionBuilder, Rotation,
    RotationBuilder,
};
pub use keys::{Signature, Signer, Verfer};
pub use state::{build_key_state, rotate_witnesses, KeyState, TRAIT_ESTABLISHMENT_ONLY};
pub use validation::{validate_chain_link, verify_chain};
