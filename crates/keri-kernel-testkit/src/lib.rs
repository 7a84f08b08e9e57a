//! # KERI Kernel Testkit
//!
//! Testing utilities for the KERI kernel.
//!
//! - **Fixtures**: deterministic signers and ready-made event chains for
//!   scenario tests
//! - **Generators**: proptest strategies for property-based testing
//!
//! ## Fixtures
//!
//! ```rust
//! use keri_kernel_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::with_seeds([1; 32], [2; 32]);
//! let inception = fixture.make_inception();
//! assert_eq!(inception.prefix, inception.said);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keri_kernel_testkit::generators;
//!
//! proptest! {
//!     #[test]
//!     fn qb64_roundtrip((code, raw) in generators::matter()) {
//!         let m = keri_kernel_core::Matter::new(&code, &raw).unwrap();
//!         let decoded = keri_kernel_core::Matter::from_qb64(&m.qb64()).unwrap();
//!         prop_assert_eq!(decoded.raw(), raw.as_slice());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{seeded_signers, TestFixture};
