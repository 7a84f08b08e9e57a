//! Ed25519 signing and verification with CESR encoding.
//!
//! A [`Signer`] owns a 32-byte seed plus the transferability flag that
//! decides whether its derived public key takes code `D` (transferable) or
//! `B` (non-transferable). A [`Verfer`] is the public half. Both are value
//! types and safe to clone and share.

use std::fmt;

use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey, Verifier as _, VerifyingKey,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::cesr::{codes, Matter};
use crate::error::CoreError;

/// A 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Parse from a byte slice, validating the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let arr: [u8; 64] = bytes.try_into().map_err(|_| CoreError::InvalidSize {
            code: codes::ED25519_SIG.to_string(),
            expected: 64,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Render the CESR qb64 form (`0B`-prefixed, 88 characters).
    pub fn qb64(&self) -> String {
        Matter::new(codes::ED25519_SIG, &self.0)
            .expect("signature length is fixed")
            .qb64()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &hex::encode(self.0)[..16])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Ed25519 signing key material.
#[derive(Clone)]
pub struct Signer {
    seed: [u8; 32],
    transferable: bool,
}

impl Signer {
    /// Generate a fresh signer from the platform's cryptographic RNG.
    pub fn new_random(transferable: bool) -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self { seed, transferable }
    }

    /// Build a signer from an explicit 32-byte seed.
    pub const fn from_seed(seed: [u8; 32], transferable: bool) -> Self {
        Self { seed, transferable }
    }

    /// Import a seed from its qb64 form; the code must be `A`.
    pub fn from_qb64(qb64: &str, transferable: bool) -> Result<Self, CoreError> {
        let matter = Matter::from_qb64(qb64)?;
        if matter.code() != codes::ED25519_SEED {
            return Err(CoreError::InvalidCode(matter.code().to_string()));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(matter.raw());
        Ok(Self { seed, transferable })
    }

    /// Export the seed as qb64 (`A`-prefixed, 44 characters).
    pub fn qb64(&self) -> String {
        Matter::new(codes::ED25519_SEED, &self.seed)
            .expect("seed length is fixed")
            .qb64()
    }

    /// Whether the derived public key is transferable.
    pub const fn transferable(&self) -> bool {
        self.transferable
    }

    /// Sign a message. Deterministic per RFC 8032: the same seed and message
    /// always produce byte-identical signatures.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let key = SigningKey::from_bytes(&self.seed);
        Signature(key.sign(message).to_bytes())
    }

    /// Derive the public half.
    pub fn verfer(&self) -> Verfer {
        let key = SigningKey::from_bytes(&self.seed);
        Verfer {
            public: key.verifying_key().to_bytes(),
            transferable: self.transferable,
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({:?})", self.verfer())
    }
}

/// Ed25519 public key with its CESR code.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Verfer {
    public: [u8; 32],
    transferable: bool,
}

impl Verfer {
    /// Import from qb64; only codes `D` and `B` are accepted.
    pub fn from_qb64(qb64: &str) -> Result<Self, CoreError> {
        let matter = Matter::from_qb64(qb64)?;
        let transferable = match matter.code() {
            codes::ED25519 => true,
            codes::ED25519N => false,
            code => return Err(CoreError::InvalidCode(code.to_string())),
        };
        let mut public = [0u8; 32];
        public.copy_from_slice(matter.raw());
        Ok(Self {
            public,
            transferable,
        })
    }

    /// The derivation code: `D` for transferable keys, `B` otherwise.
    pub const fn code(&self) -> &'static str {
        if self.transferable {
            codes::ED25519
        } else {
            codes::ED25519N
        }
    }

    /// The raw public key bytes.
    pub const fn raw(&self) -> &[u8; 32] {
        &self.public
    }

    /// Whether this key belongs to a transferable identifier.
    pub const fn transferable(&self) -> bool {
        self.transferable
    }

    /// Export as qb64 (44 characters).
    pub fn qb64(&self) -> String {
        Matter::new(self.code(), &self.public)
            .expect("public key length is fixed")
            .qb64()
    }

    /// Verify a signature over a message.
    ///
    /// Returns `Ok(false)` for a cryptographically invalid signature; errors
    /// only when the inputs themselves are malformed.
    pub fn verify(&self, signature: &[u8], message: &[u8]) -> Result<bool, CoreError> {
        let sig_bytes: [u8; 64] = signature.try_into().map_err(|_| CoreError::InvalidSize {
            code: codes::ED25519_SIG.to_string(),
            expected: 64,
            actual: signature.len(),
        })?;

        let key = VerifyingKey::from_bytes(&self.public).map_err(|_| CoreError::InvalidPublicKey)?;
        let sig = DalekSignature::from_bytes(&sig_bytes);
        Ok(key.verify(message, &sig).is_ok())
    }
}

impl fmt::Debug for Verfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Verfer({}{})", self.code(), &hex::encode(self.public)[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = Signer::from_seed([0x01; 32], true);
        let message = b"Hello, KERI!";
        let signature = signer.sign(message);

        assert_eq!(signature.as_bytes().len(), 64);
        assert!(signer.verfer().verify(signature.as_ref(), message).unwrap());
        assert!(!signer
            .verfer()
            .verify(signature.as_ref(), b"Wrong message")
            .unwrap());
    }

    #[test]
    fn test_sign_deterministic() {
        let signer = Signer::from_seed([0x42; 32], true);
        let s1 = signer.sign(b"deterministic");
        let s2 = signer.sign(b"deterministic");
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_verfer_codes() {
        let transferable = Signer::from_seed([0x01; 32], true).verfer();
        let qb64 = transferable.qb64();
        assert_eq!(qb64.len(), 44);
        assert!(qb64.starts_with('D'));

        let fixed = Signer::from_seed([0x01; 32], false).verfer();
        assert!(fixed.qb64().starts_with('B'));
    }

    #[test]
    fn test_signer_qb64_roundtrip() {
        let signer = Signer::from_seed([0x07; 32], true);
        let qb64 = signer.qb64();
        assert!(qb64.starts_with('A'));

        let imported = Signer::from_qb64(&qb64, true).unwrap();
        assert_eq!(imported.verfer(), signer.verfer());
        assert_eq!(imported.sign(b"m"), signer.sign(b"m"));
    }

    #[test]
    fn test_signer_rejects_wrong_code() {
        let pubkey = Signer::from_seed([0x07; 32], true).verfer().qb64();
        assert!(matches!(
            Signer::from_qb64(&pubkey, true),
            Err(CoreError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_verfer_qb64_roundtrip() {
        let verfer = Signer::from_seed([0x09; 32], false).verfer();
        let recovered = Verfer::from_qb64(&verfer.qb64()).unwrap();
        assert_eq!(recovered, verfer);
        assert!(!recovered.transferable());
    }

    #[test]
    fn test_verfer_rejects_digest_code() {
        let digest = crate::digest::Diger::digest(b"x").qb64();
        assert!(matches!(
            Verfer::from_qb64(&digest),
            Err(CoreError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_verify_malformed_signature_is_error() {
        let verfer = Signer::from_seed([0x01; 32], true).verfer();
        let result = verfer.verify(&[0u8; 32], b"message");
        assert!(matches!(result, Err(CoreError::InvalidSize { .. })));
    }

    #[test]
    fn test_garbage_signature_is_false_not_error() {
        let verfer = Signer::from_seed([0x01; 32], true).verfer();
        let result = verfer.verify(&[0xffu8; 64], b"message").unwrap();
        assert!(!result);
    }

    #[test]
    fn test_random_signers_differ() {
        let a = Signer::new_random(true);
        let b = Signer::new_random(true);
        assert_ne!(a.verfer(), b.verfer());
    }
}
