//! Key state: the fold of an identifier's event log.
//!
//! [`KeyState`] is a value object; the transition functions return a
//! successor state and never mutate in place. Replay is deterministic apart
//! from the advisory timestamp, which never participates in equality-relevant
//! logic or digests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::event::{
    next_key_commitment, parse_seq, parse_threshold, Event, Ilk, Inception, Interaction, Rotation,
};

/// Configuration trait marking an identifier as establishment-only.
pub const TRAIT_ESTABLISHMENT_ONLY: &str = "EO";

/// Current state of an identifier, derived by replaying its log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyState {
    pub prefix: String,
    pub sequence: u64,
    pub digest: String,
    pub keys: Vec<String>,
    pub next_keys_digest: Vec<String>,
    pub threshold: u64,
    pub next_threshold: u64,
    pub witnesses: Vec<String>,
    pub witness_threshold: u64,
    pub delegator: Option<String>,
    pub last_event_type: Ilk,
    pub establishment_only: bool,
    pub timestamp: DateTime<Utc>,
}

impl KeyState {
    /// Initial state from an inception event.
    pub fn from_inception(event: &Inception) -> Result<Self, ValidationError> {
        let threshold = parse_threshold(event.ilk, &event.key_threshold)?;
        let next_threshold = parse_threshold(event.ilk, &event.next_threshold)?;
        let witness_threshold = parse_threshold(event.ilk, &event.witness_threshold)?;

        Ok(Self {
            prefix: event.prefix.clone(),
            sequence: 0,
            digest: event.said.clone(),
            keys: event.keys.clone(),
            next_keys_digest: event.next_keys.clone(),
            threshold,
            next_threshold,
            witnesses: event.witnesses.clone(),
            witness_threshold,
            delegator: None,
            last_event_type: Ilk::Inception,
            establishment_only: event
                .config
                .iter()
                .any(|trait_| trait_ == TRAIT_ESTABLISHMENT_ONLY),
            timestamp: Utc::now(),
        })
    }

    /// Apply a rotation: checks the sequence and prior-digest links, verifies
    /// the pre-rotation commitment against the new key set, and evolves the
    /// witness set by the cuts/adds procedure.
    pub fn apply_rotation(&self, event: &Rotation) -> Result<Self, ValidationError> {
        let seq = parse_seq(&event.sequence)?;
        if seq != self.sequence + 1 {
            return Err(ValidationError::SequenceOutOfOrder {
                expected: self.sequence + 1,
                got: seq,
            });
        }
        if event.prior != self.digest {
            return Err(ValidationError::PriorDigestMismatch {
                seq,
                expected: self.digest.clone(),
                got: event.prior.clone(),
            });
        }

        let threshold = parse_threshold(event.ilk, &event.key_threshold)?;
        let next_threshold = parse_threshold(event.ilk, &event.next_threshold)?;
        let witness_threshold = parse_threshold(event.ilk, &event.witness_threshold)?;

        let commitment = next_key_commitment(&event.keys, next_threshold);
        if commitment != self.next_keys_digest {
            return Err(ValidationError::NextKeysMismatch {
                expected: self.next_keys_digest.clone(),
                got: commitment,
            });
        }

        let witnesses = rotate_witnesses(&self.witnesses, &event.witness_cuts, &event.witness_adds);

        Ok(Self {
            prefix: self.prefix.clone(),
            sequence: seq,
            digest: event.said.clone(),
            keys: event.keys.clone(),
            next_keys_digest: event.next_keys.clone(),
            threshold,
            next_threshold,
            witnesses,
            witness_threshold,
            delegator: self.delegator.clone(),
            last_event_type: Ilk::Rotation,
            establishment_only: self.establishment_only,
            timestamp: Utc::now(),
        })
    }

    /// Apply an interaction: advances only the sequence, digest, and
    /// last-event-type. Keys, thresholds, and witnesses stay untouched.
    pub fn apply_interaction(&self, event: &Interaction) -> Result<Self, ValidationError> {
        if self.establishment_only {
            return Err(ValidationError::EstablishmentOnly);
        }

        let seq = parse_seq(&event.sequence)?;
        if seq != self.sequence + 1 {
            return Err(ValidationError::SequenceOutOfOrder {
                expected: self.sequence + 1,
                got: seq,
            });
        }
        if event.prior != self.digest {
            return Err(ValidationError::PriorDigestMismatch {
                seq,
                expected: self.digest.clone(),
                got: event.prior.clone(),
            });
        }

        Ok(Self {
            sequence: seq,
            digest: event.said.clone(),
            last_event_type: Ilk::Interaction,
            timestamp: Utc::now(),
            ..self.clone()
        })
    }
}

/// Witness set evolution on rotation: `(previous − cuts) ‖ adds`,
/// deduplicated, preserving insertion order.
pub fn rotate_witnesses(previous: &[String], cuts: &[String], adds: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(previous.len() + adds.len());
    let kept = previous.iter().filter(|w| !cuts.contains(w));
    for witness in kept.chain(adds.iter()) {
        if !out.contains(witness) {
            out.push(witness.clone());
        }
    }
    out
}

/// Fold an identifier's ordered events into its terminal key state.
pub fn build_key_state(events: &[Event]) -> Result<KeyState, ValidationError> {
    let mut iter = events.iter();
    let first = iter.next().ok_or(ValidationError::EmptyLog)?;

    let Event::Inception(inception) = first else {
        return Err(ValidationError::FirstEventNotInception);
    };
    let mut state = KeyState::from_inception(inception)?;

    for event in iter {
        state = match event {
            Event::Inception(_) => return Err(ValidationError::UnexpectedInception),
            Event::Rotation(rotation) => state.apply_rotation(rotation)?,
            Event::Interaction(interaction) => state.apply_interaction(interaction)?,
        };
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{InceptionBuilder, InteractionBuilder, RotationBuilder};
    use crate::keys::Signer;

    fn signer(byte: u8) -> Signer {
        Signer::from_seed([byte; 32], true)
    }

    fn incept(witnesses: Vec<String>, threshold: Option<u64>, config: Vec<String>) -> Inception {
        let commitment = next_key_commitment(&[signer(2).verfer().qb64()], 1);
        let mut builder = InceptionBuilder::new(vec![signer(1).verfer().qb64()], commitment)
            .witnesses(witnesses)
            .config(config);
        if let Some(bt) = threshold {
            builder = builder.witness_threshold(bt);
        }
        builder.build().unwrap()
    }

    fn rotate(state: &KeyState, new: u8, next: u8) -> Rotation {
        let commitment = next_key_commitment(&[signer(next).verfer().qb64()], 1);
        RotationBuilder::new(
            &state.prefix,
            state.sequence + 1,
            &state.digest,
            vec![signer(new).verfer().qb64()],
            commitment,
        )
        .build()
        .unwrap()
    }

    #[test]
    fn test_from_inception() {
        let event = incept(vec![], None, vec![]);
        let state = KeyState::from_inception(&event).unwrap();

        assert_eq!(state.prefix, event.prefix);
        assert_eq!(state.sequence, 0);
        assert_eq!(state.digest, event.said);
        assert_eq!(state.keys, vec![signer(1).verfer().qb64()]);
        assert_eq!(state.threshold, 1);
        assert_eq!(state.next_threshold, 1);
        assert!(state.witnesses.is_empty());
        assert_eq!(state.witness_threshold, 0);
        assert_eq!(state.last_event_type, Ilk::Inception);
        assert!(!state.establishment_only);
    }

    #[test]
    fn test_rotation_advances_state() {
        let event = incept(vec![], None, vec![]);
        let state = KeyState::from_inception(&event).unwrap();

        let rotation = rotate(&state, 2, 3);
        let rotated = state.apply_rotation(&rotation).unwrap();

        assert_eq!(rotated.sequence, 1);
        assert_eq!(rotated.digest, rotation.said);
        assert_eq!(rotated.keys, vec![signer(2).verfer().qb64()]);
        assert_eq!(
            rotated.next_keys_digest,
            next_key_commitment(&[signer(3).verfer().qb64()], 1)
        );
        assert_eq!(rotated.last_event_type, Ilk::Rotation);
    }

    #[test]
    fn test_rotation_with_uncommitted_key_refused() {
        let event = incept(vec![], None, vec![]);
        let state = KeyState::from_inception(&event).unwrap();

        // Key 9 was never committed; the inception committed to key 2.
        let commitment = next_key_commitment(&[signer(3).verfer().qb64()], 1);
        let rotation = RotationBuilder::new(
            &state.prefix,
            1,
            &state.digest,
            vec![signer(9).verfer().qb64()],
            commitment,
        )
        .build()
        .unwrap();

        let result = state.apply_rotation(&rotation);
        assert!(matches!(
            result,
            Err(ValidationError::NextKeysMismatch { .. })
        ));
    }

    #[test]
    fn test_rotation_sequence_and_prior_checks() {
        let event = incept(vec![], None, vec![]);
        let state = KeyState::from_inception(&event).unwrap();

        let commitment = next_key_commitment(&[signer(3).verfer().qb64()], 1);
        let skipped = RotationBuilder::new(
            &state.prefix,
            2,
            &state.digest,
            vec![signer(2).verfer().qb64()],
            commitment.clone(),
        )
        .build()
        .unwrap();
        assert!(matches!(
            state.apply_rotation(&skipped),
            Err(ValidationError::SequenceOutOfOrder {
                expected: 1,
                got: 2
            })
        ));

        let wrong_prior = RotationBuilder::new(
            &state.prefix,
            1,
            &crate::digest::Diger::digest(b"not the prior").qb64(),
            vec![signer(2).verfer().qb64()],
            commitment,
        )
        .build()
        .unwrap();
        assert!(matches!(
            state.apply_rotation(&wrong_prior),
            Err(ValidationError::PriorDigestMismatch { .. })
        ));
    }

    #[test]
    fn test_interaction_neutrality() {
        let event = incept(vec!["w1".into()], Some(1), vec![]);
        let state = KeyState::from_inception(&event).unwrap();

        let interaction = InteractionBuilder::new(&state.prefix, 1, &state.digest)
            .build()
            .unwrap();
        let next = state.apply_interaction(&interaction).unwrap();

        assert_eq!(next.sequence, 1);
        assert_eq!(next.digest, interaction.said);
        assert_eq!(next.last_event_type, Ilk::Interaction);

        assert_eq!(next.keys, state.keys);
        assert_eq!(next.next_keys_digest, state.next_keys_digest);
        assert_eq!(next.threshold, state.threshold);
        assert_eq!(next.next_threshold, state.next_threshold);
        assert_eq!(next.witnesses, state.witnesses);
        assert_eq!(next.witness_threshold, state.witness_threshold);
    }

    #[test]
    fn test_establishment_only_refuses_interaction() {
        let event = incept(vec![], None, vec![TRAIT_ESTABLISHMENT_ONLY.to_string()]);
        let state = KeyState::from_inception(&event).unwrap();
        assert!(state.establishment_only);

        let interaction = InteractionBuilder::new(&state.prefix, 1, &state.digest)
            .build()
            .unwrap();
        assert!(matches!(
            state.apply_interaction(&interaction),
            Err(ValidationError::EstablishmentOnly)
        ));

        // Rotation remains permitted.
        let rotation = rotate(&state, 2, 3);
        state.apply_rotation(&rotation).unwrap();
    }

    #[test]
    fn test_rotate_witnesses() {
        let previous = vec!["w1".to_string(), "w2".to_string()];
        let rotated = rotate_witnesses(&previous, &["w1".to_string()], &["w3".to_string()]);
        assert_eq!(rotated, vec!["w2".to_string(), "w3".to_string()]);

        // Re-adding an existing witness does not duplicate it.
        let rotated = rotate_witnesses(&previous, &[], &["w2".to_string(), "w4".to_string()]);
        assert_eq!(
            rotated,
            vec!["w1".to_string(), "w2".to_string(), "w4".to_string()]
        );

        // Cut and re-add moves the witness to the tail.
        let rotated = rotate_witnesses(&previous, &["w1".to_string()], &["w1".to_string()]);
        assert_eq!(rotated, vec!["w2".to_string(), "w1".to_string()]);
    }

    #[test]
    fn test_build_key_state_folds_in_order() {
        let event = incept(vec![], None, vec![]);
        let state0 = KeyState::from_inception(&event).unwrap();

        let ixn = InteractionBuilder::new(&state0.prefix, 1, &state0.digest)
            .build()
            .unwrap();
        let state1 = state0.apply_interaction(&ixn).unwrap();
        let rot = rotate(&state1, 2, 3);

        let events = vec![
            Event::Inception(event),
            Event::Interaction(ixn),
            Event::Rotation(rot.clone()),
        ];
        let state = build_key_state(&events).unwrap();

        assert_eq!(state.sequence, 2);
        assert_eq!(state.digest, rot.said);
        assert_eq!(state.keys, vec![signer(2).verfer().qb64()]);
    }

    #[test]
    fn test_build_key_state_requires_inception_first() {
        assert!(matches!(
            build_key_state(&[]),
            Err(ValidationError::EmptyLog)
        ));

        let event = incept(vec![], None, vec![]);
        let state = KeyState::from_inception(&event).unwrap();
        let ixn = InteractionBuilder::new(&state.prefix, 1, &state.digest)
            .build()
            .unwrap();
        assert!(matches!(
            build_key_state(&[Event::Interaction(ixn)]),
            Err(ValidationError::FirstEventNotInception)
        ));
    }
}
