//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keri_kernel_core::{sizage, Signer};

/// All derivation codes the kernel supports.
pub const SUPPORTED_CODES: [&str; 5] = ["A", "B", "D", "E", "0B"];

/// Generate a supported derivation code.
pub fn supported_code() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("A"),
        Just("B"),
        Just("D"),
        Just("E"),
        Just("0B"),
    ]
}

/// Generate a (code, raw) pair with the exact raw size for the code.
pub fn matter() -> impl Strategy<Value = (String, Vec<u8>)> {
    supported_code().prop_flat_map(|code| {
        let len = sizage(code).expect("supported code has a size entry").raw;
        prop::collection::vec(any::<u8>(), len)
            .prop_map(move |raw| (code.to_string(), raw))
    })
}

/// Generate a 32-byte seed.
pub fn seed() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

/// Generate a deterministic signer.
pub fn keypair() -> impl Strategy<Value = Signer> {
    (seed(), any::<bool>()).prop_map(|(seed, transferable)| Signer::from_seed(seed, transferable))
}

/// Generate message bytes.
pub fn message(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}
