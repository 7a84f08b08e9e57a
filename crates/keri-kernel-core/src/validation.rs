//! Chain-level validation shared by the log backends.

use crate::error::ValidationError;
use crate::event::{Event, Ilk};

/// Validate a candidate event against the head of its prefix's log.
///
/// `head` is `(sequence, digest)` of the newest stored entry, or `None` when
/// the prefix has no entries yet. Both log backends call this before
/// inserting, so the append rules cannot drift between them.
pub fn validate_chain_link(
    head: Option<(u64, &str)>,
    event: &Event,
) -> Result<(), ValidationError> {
    event.validate()?;

    match head {
        None => {
            if !matches!(event, Event::Inception(_)) {
                return Err(ValidationError::PriorEventNotFound(event.sequence()?));
            }
            Ok(())
        }
        Some((head_seq, head_digest)) => {
            let seq = event.sequence()?;
            if matches!(event, Event::Inception(_)) {
                return Err(ValidationError::UnexpectedInception);
            }
            if seq != head_seq + 1 {
                return Err(ValidationError::SequenceOutOfOrder {
                    expected: head_seq + 1,
                    got: seq,
                });
            }
            match event.prior() {
                Some(prior) if prior == head_digest => Ok(()),
                Some(prior) => Err(ValidationError::PriorDigestMismatch {
                    seq,
                    expected: head_digest.to_string(),
                    got: prior.to_string(),
                }),
                None => Err(ValidationError::MissingPriorDigest),
            }
        }
    }
}

/// Replay a full log: the first event must be an inception (`icp` or `dip`),
/// sequences must increase by exactly one, and every `p` must equal the
/// predecessor's `d`. Signature verification is not performed here.
pub fn verify_chain(events: &[Event]) -> Result<(), ValidationError> {
    let mut iter = events.iter();
    let first = iter.next().ok_or(ValidationError::EmptyLog)?;

    if !matches!(first.ilk(), Ilk::Inception | Ilk::DelegatedInception) {
        return Err(ValidationError::FirstEventNotInception);
    }
    let mut prev_seq = first.sequence()?;
    if prev_seq != 0 {
        return Err(ValidationError::FirstSequenceNotZero(prev_seq));
    }
    let mut prev_digest = first.said();

    for event in iter {
        let seq = event.sequence()?;
        if seq != prev_seq + 1 {
            return Err(ValidationError::SequenceOutOfOrder {
                expected: prev_seq + 1,
                got: seq,
            });
        }
        match event.prior() {
            Some(prior) if prior == prev_digest => {}
            Some(prior) => {
                return Err(ValidationError::PriorDigestMismatch {
                    seq,
                    expected: prev_digest.to_string(),
                    got: prior.to_string(),
                })
            }
            None => return Err(ValidationError::MissingPriorDigest),
        }
        prev_seq = seq;
        prev_digest = event.said();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Diger;
    use crate::event::{
        next_key_commitment, InceptionBuilder, InteractionBuilder, RotationBuilder,
    };
    use crate::keys::Signer;

    fn chain() -> Vec<Event> {
        let s1 = Signer::from_seed([1; 32], true);
        let s2 = Signer::from_seed([2; 32], true);
        let s3 = Signer::from_seed([3; 32], true);

        let icp = InceptionBuilder::new(
            vec![s1.verfer().qb64()],
            next_key_commitment(&[s2.verfer().qb64()], 1),
        )
        .build()
        .unwrap();

        let ixn = InteractionBuilder::new(&icp.prefix, 1, &icp.said)
            .build()
            .unwrap();

        let rot = RotationBuilder::new(
            &icp.prefix,
            2,
            &ixn.said,
            vec![s2.verfer().qb64()],
            next_key_commitment(&[s3.verfer().qb64()], 1),
        )
        .build()
        .unwrap();

        vec![
            Event::Inception(icp),
            Event::Interaction(ixn),
            Event::Rotation(rot),
        ]
    }

    #[test]
    fn test_valid_chain() {
        verify_chain(&chain()).unwrap();
    }

    #[test]
    fn test_chain_link_first_event() {
        let events = chain();
        validate_chain_link(None, &events[0]).unwrap();

        // A non-inception cannot open a log.
        assert!(matches!(
            validate_chain_link(None, &events[1]),
            Err(ValidationError::PriorEventNotFound(1))
        ));
    }

    #[test]
    fn test_chain_link_successors() {
        let events = chain();
        let head = (0, events[0].said());
        validate_chain_link(Some(head), &events[1]).unwrap();

        // Appending the interaction again at head 1 is out of order.
        let head = (1, events[1].said());
        assert!(matches!(
            validate_chain_link(Some(head), &events[1]),
            Err(ValidationError::SequenceOutOfOrder { .. })
        ));

        // A second inception is refused outright.
        assert!(matches!(
            validate_chain_link(Some(head), &events[0]),
            Err(ValidationError::UnexpectedInception)
        ));
    }

    #[test]
    fn test_chain_link_prior_digest() {
        let events = chain();
        let wrong = Diger::digest(b"elsewhere").qb64();
        assert!(matches!(
            validate_chain_link(Some((0, wrong.as_str())), &events[1]),
            Err(ValidationError::PriorDigestMismatch { seq: 1, .. })
        ));
    }

    #[test]
    fn test_broken_chain_detected() {
        let mut events = chain();
        events.remove(1);
        assert!(matches!(
            verify_chain(&events),
            Err(ValidationError::SequenceOutOfOrder {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn test_chain_must_start_with_inception() {
        let events = chain();
        assert!(matches!(
            verify_chain(&events[1..]),
            Err(ValidationError::FirstEventNotInception)
        ));
    }
}
