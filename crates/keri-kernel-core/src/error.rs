//! Error types for the core primitives.

use thiserror::Error;

/// Errors from the encoding and cryptographic primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid CESR code: {0}")]
    InvalidCode(String),

    #[error("invalid size for code {code}: expected {expected}, got {actual}")]
    InvalidSize {
        code: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Structural and chain-level validation errors for key events.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("unsupported event type: {0}")]
    UnsupportedEventType(String),

    #[error("event type tag does not match its shape: {0}")]
    WrongEventType(String),

    #[error("malformed version string: {0}")]
    MalformedVersion(String),

    #[error("malformed sequence number: {0}")]
    MalformedSequence(String),

    #[error("malformed threshold: {0}")]
    MalformedThreshold(String),

    #[error("inception sequence must be \"0\", got {0:?}")]
    InceptionSequenceNotZero(String),

    #[error("{ilk} sequence must be greater than 0")]
    SequenceMustBePositive { ilk: &'static str },

    #[error("threshold {threshold} invalid for {keys} keys")]
    ThresholdExceedsKeys { threshold: u64, keys: usize },

    #[error("witness threshold {threshold} invalid for {witnesses} witnesses")]
    InvalidWitnessThreshold { threshold: u64, witnesses: usize },

    #[error("duplicate witness: {0}")]
    DuplicateWitness(String),

    #[error("missing prior-event digest")]
    MissingPriorDigest,

    #[error("inception identifier does not equal its digest")]
    PrefixDigestMismatch,

    #[error("event prefix mismatch: expected {expected}, got {got}")]
    PrefixMismatch { expected: String, got: String },

    #[error("self-addressing identifier mismatch: expected {expected}, got {got}")]
    SaidMismatch { expected: String, got: String },

    #[error("no events to replay")]
    EmptyLog,

    #[error("first event for a prefix must be an inception")]
    FirstEventNotInception,

    #[error("first sequence must be 0, got {0}")]
    FirstSequenceNotZero(u64),

    #[error("inception event after sequence 0")]
    UnexpectedInception,

    #[error("sequence out of order: expected {expected}, got {got}")]
    SequenceOutOfOrder { expected: u64, got: u64 },

    #[error("prior-digest mismatch at sequence {seq}: expected {expected}, got {got}")]
    PriorDigestMismatch {
        seq: u64,
        expected: String,
        got: String,
    },

    #[error("prior event not found for sequence {0}")]
    PriorEventNotFound(u64),

    #[error("next-keys commitment mismatch: expected {expected:?}, got {got:?}")]
    NextKeysMismatch {
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("identifier is establishment-only; interaction events are refused")]
    EstablishmentOnly,

    #[error(transparent)]
    Core(#[from] CoreError),
}
