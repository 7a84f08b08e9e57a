//! CESR primitives: a (code, raw bytes) pair and its qb64 text form.
//!
//! Every cryptographic value carried by this kernel is "matter": raw bytes
//! qualified by a one- or two-character derivation code. The text form is
//! `code || base64url(raw)` without padding characters, and its total length
//! must equal the fixed qb64 size for the code.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::CoreError;

/// Derivation codes supported by this kernel.
pub mod codes {
    /// Ed25519 256-bit seed.
    pub const ED25519_SEED: &str = "A";
    /// Ed25519 non-transferable public key.
    pub const ED25519N: &str = "B";
    /// Ed25519 transferable public key.
    pub const ED25519: &str = "D";
    /// BLAKE3-256 digest.
    pub const BLAKE3_256: &str = "E";
    /// Ed25519 signature.
    pub const ED25519_SIG: &str = "0B";
}

/// Fixed sizes for a derivation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizage {
    /// Length of the code itself in characters.
    pub hard: usize,
    /// Raw size in bytes.
    pub raw: usize,
    /// Full qb64 size in characters.
    pub qb64: usize,
}

/// Look up the size table entry for a code.
pub fn sizage(code: &str) -> Result<Sizage, CoreError> {
    match code {
        codes::ED25519_SEED | codes::ED25519N | codes::ED25519 | codes::BLAKE3_256 => Ok(Sizage {
            hard: 1,
            raw: 32,
            qb64: 44,
        }),
        codes::ED25519_SIG => Ok(Sizage {
            hard: 2,
            raw: 64,
            qb64: 88,
        }),
        _ => Err(CoreError::InvalidCode(code.to_string())),
    }
}

/// Extract the leading derivation code from a qb64 string.
pub fn extract_code(qb64: &str) -> Result<&str, CoreError> {
    let first = qb64
        .chars()
        .next()
        .ok_or_else(|| CoreError::InvalidCode("empty qb64".to_string()))?;

    let hard = match first {
        'A'..='Z' => 1,
        '0' => 2,
        _ => {
            return Err(CoreError::InvalidCode(format!(
                "unknown code prefix: {first}"
            )))
        }
    };

    if qb64.len() < hard || !qb64.is_char_boundary(hard) {
        return Err(CoreError::InvalidCode(qb64.to_string()));
    }
    Ok(&qb64[..hard])
}

/// A CESR primitive: a derivation code plus raw bytes of the exact size the
/// code prescribes.
#[derive(Clone, PartialEq, Eq)]
pub struct Matter {
    code: String,
    raw: Vec<u8>,
}

impl Matter {
    /// Construct from a code and raw bytes, validating the raw size.
    pub fn new(code: &str, raw: &[u8]) -> Result<Self, CoreError> {
        let sz = sizage(code)?;
        if raw.len() != sz.raw {
            return Err(CoreError::InvalidSize {
                code: code.to_string(),
                expected: sz.raw,
                actual: raw.len(),
            });
        }
        Ok(Self {
            code: code.to_string(),
            raw: raw.to_vec(),
        })
    }

    /// Decode the qb64 text form, validating both lengths exactly.
    pub fn from_qb64(qb64: &str) -> Result<Self, CoreError> {
        let code = extract_code(qb64)?;
        let sz = sizage(code)?;
        if qb64.len() != sz.qb64 {
            return Err(CoreError::InvalidSize {
                code: code.to_string(),
                expected: sz.qb64,
                actual: qb64.len(),
            });
        }

        let raw = URL_SAFE_NO_PAD
            .decode(&qb64[sz.hard..])
            .map_err(|e| CoreError::Base64(e.to_string()))?;
        if raw.len() != sz.raw {
            return Err(CoreError::InvalidSize {
                code: code.to_string(),
                expected: sz.raw,
                actual: raw.len(),
            });
        }

        Ok(Self {
            code: code.to_string(),
            raw,
        })
    }

    /// The derivation code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The raw bytes.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Render the qb64 text form.
    pub fn qb64(&self) -> String {
        format!("{}{}", self.code, URL_SAFE_NO_PAD.encode(&self.raw))
    }
}

impl fmt::Debug for Matter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matter({})", self.qb64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_roundtrip() {
        let raw: Vec<u8> = (1..=32).collect();
        let matter = Matter::new(codes::ED25519_SEED, &raw).unwrap();
        let qb64 = matter.qb64();

        assert_eq!(qb64.len(), 44);
        assert!(qb64.starts_with('A'));

        let decoded = Matter::from_qb64(&qb64).unwrap();
        assert_eq!(decoded.code(), codes::ED25519_SEED);
        assert_eq!(decoded.raw(), raw.as_slice());
        assert_eq!(decoded.qb64(), qb64);
    }

    #[test]
    fn test_signature_roundtrip() {
        let raw = [0x5au8; 64];
        let matter = Matter::new(codes::ED25519_SIG, &raw).unwrap();
        let qb64 = matter.qb64();

        assert_eq!(qb64.len(), 88);
        assert!(qb64.starts_with("0B"));

        let decoded = Matter::from_qb64(&qb64).unwrap();
        assert_eq!(decoded.code(), codes::ED25519_SIG);
        assert_eq!(decoded.raw(), raw.as_slice());
    }

    #[test]
    fn test_all_fixed_sizes() {
        for (code, raw_len, qb64_len) in [
            (codes::ED25519_SEED, 32, 44),
            (codes::ED25519N, 32, 44),
            (codes::ED25519, 32, 44),
            (codes::BLAKE3_256, 32, 44),
            (codes::ED25519_SIG, 64, 88),
        ] {
            let matter = Matter::new(code, &vec![7u8; raw_len]).unwrap();
            assert_eq!(matter.qb64().len(), qb64_len, "qb64 size for code {code}");
        }
    }

    #[test]
    fn test_wrong_raw_size() {
        let result = Matter::new(codes::ED25519_SEED, &[0u8; 16]);
        assert!(matches!(result, Err(CoreError::InvalidSize { .. })));
    }

    #[test]
    fn test_unknown_code() {
        let result = Matter::new("Z", &[0u8; 32]);
        assert!(matches!(result, Err(CoreError::InvalidCode(_))));

        let result = Matter::from_qb64(&format!("Z{}", "A".repeat(43)));
        assert!(matches!(result, Err(CoreError::InvalidCode(_))));
    }

    #[test]
    fn test_wrong_qb64_length() {
        let matter = Matter::new(codes::BLAKE3_256, &[1u8; 32]).unwrap();
        let mut qb64 = matter.qb64();
        qb64.pop();
        assert!(matches!(
            Matter::from_qb64(&qb64),
            Err(CoreError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_extract_code() {
        assert_eq!(extract_code("Dabc").unwrap(), "D");
        assert_eq!(extract_code("0Babc").unwrap(), "0B");
        assert!(extract_code("").is_err());
        assert!(extract_code("_x").is_err());
    }
}
