//! BLAKE3-256 digests in CESR form.

use std::fmt;

use crate::cesr::{codes, Matter};
use crate::error::CoreError;

/// A BLAKE3-256 digest, carried with the `E` derivation code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Diger {
    raw: [u8; 32],
}

impl Diger {
    /// Compute the digest of arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        Self {
            raw: *blake3::hash(data).as_bytes(),
        }
    }

    /// Wrap an existing 32-byte digest.
    pub const fn from_raw(raw: [u8; 32]) -> Self {
        Self { raw }
    }

    /// Decode a qb64 digest; the code must be `E`.
    pub fn from_qb64(qb64: &str) -> Result<Self, CoreError> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != codes::BLAKE3_256 {
            return Err(CoreError::InvalidCode(matter.code().to_string()));
        }
        let mut raw = [0u8; 32];
        raw.copy_from_slice(matter.raw());
        Ok(Self { raw })
    }

    /// The raw digest bytes.
    pub const fn raw(&self) -> &[u8; 32] {
        &self.raw
    }

    /// Render the qb64 text form (44 characters, `E`-prefixed).
    pub fn qb64(&self) -> String {
        Matter::new(codes::BLAKE3_256, &self.raw)
            .expect("digest length is fixed")
            .qb64()
    }

    /// True iff this digest matches the given bytes.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::digest(data).raw == self.raw
    }
}

impl fmt::Debug for Diger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Diger({})", self.qb64())
    }
}
