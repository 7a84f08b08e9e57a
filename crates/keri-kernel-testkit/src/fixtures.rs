//! Test fixtures and helpers.
//!
//! Common setup code for scenario and integration tests: deterministic
//! signers and pre-built event chains.

use keri_kernel_core::{
    next_key_commitment, Event, Inception, InceptionBuilder, Interaction, InteractionBuilder,
    Rotation, RotationBuilder, Signer,
};

/// A fixture holding the current and next signer for one identifier.
pub struct TestFixture {
    pub signer: Signer,
    pub next_signer: Signer,
}

impl TestFixture {
    /// Random signers.
    pub fn new() -> Self {
        Self {
            signer: Signer::new_random(true),
            next_signer: Signer::new_random(true),
        }
    }

    /// Deterministic signers from explicit seeds.
    pub fn with_seeds(signer: [u8; 32], next_signer: [u8; 32]) -> Self {
        Self {
            signer: Signer::from_seed(signer, true),
            next_signer: Signer::from_seed(next_signer, true),
        }
    }

    /// The commitment the inception publishes for `next_signer`.
    pub fn commitment(&self) -> Vec<String> {
        next_key_commitment(&[self.next_signer.verfer().qb64()], 1)
    }

    /// Build an inception event for this fixture's keys.
    pub fn make_inception(&self) -> Inception {
        InceptionBuilder::new(vec![self.signer.verfer().qb64()], self.commitment())
            .build()
            .expect("fixture inception is well-formed")
    }

    /// Build a rotation revealing `next_signer`'s key and committing to
    /// `new_next`.
    pub fn make_rotation(
        &self,
        prefix: &str,
        sequence: u64,
        prior: &str,
        new_next: &Signer,
    ) -> Rotation {
        let commitment = next_key_commitment(&[new_next.verfer().qb64()], 1);
        RotationBuilder::new(
            prefix,
            sequence,
            prior,
            vec![self.next_signer.verfer().qb64()],
            commitment,
        )
        .build()
        .expect("fixture rotation is well-formed")
    }

    /// Build an interaction event.
    pub fn make_interaction(&self, prefix: &str, sequence: u64, prior: &str) -> Interaction {
        InteractionBuilder::new(prefix, sequence, prior)
            .build()
            .expect("fixture interaction is well-formed")
    }

    /// A three-event chain: inception, interaction, rotation.
    pub fn make_chain(&self, new_next: &Signer) -> Vec<Event> {
        let icp = self.make_inception();
        let ixn = self.make_interaction(&icp.prefix, 1, &icp.said);
        let rot = self.make_rotation(&icp.prefix, 2, &ixn.said, new_next);
        vec![
            Event::Inception(icp),
            Event::Interaction(ixn),
            Event::Rotation(rot),
        ]
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic signers with seeds `[1; 32]`, `[2; 32]`, ...
pub fn seeded_signers(count: u8) -> Vec<Signer> {
    (1..=count)
        .map(|byte| Signer::from_seed([byte; 32], true))
        .collect()
}
