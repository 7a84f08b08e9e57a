//! The key event object model: inception, rotation, interaction.
//!
//! Events serialize to compact JSON in the exact field order declared on the
//! structs below; that serialization is canonical and is what gets digested
//! and signed. The `d` field (and, for inception, `i`) is self-addressing:
//! it holds the BLAKE3-256 digest of the event's own serialization, computed
//! while the field is held at an empty placeholder.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::digest::Diger;
use crate::error::{CoreError, ValidationError};

/// Event type tag ("ilk").
///
/// `dip` and `drt` are recognized so their tags stay reserved, but the kernel
/// refuses them everywhere they could enter a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ilk {
    #[serde(rename = "icp")]
    Inception,
    #[serde(rename = "rot")]
    Rotation,
    #[serde(rename = "ixn")]
    Interaction,
    #[serde(rename = "dip")]
    DelegatedInception,
    #[serde(rename = "drt")]
    DelegatedRotation,
}

impl Ilk {
    /// The wire tag for this event type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Ilk::Inception => "icp",
            Ilk::Rotation => "rot",
            Ilk::Interaction => "ixn",
            Ilk::DelegatedInception => "dip",
            Ilk::DelegatedRotation => "drt",
        }
    }
}

impl fmt::Display for Ilk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol identifier in the version string.
pub const PROTOCOL: &str = "KERI";
/// Protocol version digits in the version string.
pub const VERSION: &str = "10";
/// Serialization kind in the version string.
pub const KIND_JSON: &str = "JSON";

/// Render a version string: `KERI10JSON` + 6-digit zero-padded decimal size
/// + `_`.
pub fn versify(size: usize) -> String {
    format!("{PROTOCOL}{VERSION}{KIND_JSON}{size:06}_")
}

/// Parse a version string back into its size field.
pub fn deversify(vs: &str) -> Result<usize, ValidationError> {
    let malformed = || ValidationError::MalformedVersion(vs.to_string());

    if vs.len() != 17 || !vs.is_ascii() || !vs.ends_with('_') {
        return Err(malformed());
    }
    if &vs[..4] != PROTOCOL || &vs[4..6] != VERSION || &vs[6..10] != KIND_JSON {
        return Err(malformed());
    }
    let size = &vs[10..16];
    if !size.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    size.parse::<usize>().map_err(|_| malformed())
}

/// Render a sequence number as lowercase hex, no prefix.
pub fn seq_to_hex(seq: u64) -> String {
    format!("{seq:x}")
}

/// Parse a sequence field: lowercase hex, no `0x` prefix, no leading zeros
/// (a bare `"0"` is the only zero form).
pub fn parse_seq(s: &str) -> Result<u64, ValidationError> {
    let malformed = || ValidationError::MalformedSequence(s.to_string());

    if s.is_empty() || s.len() > 16 {
        return Err(malformed());
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(malformed());
    }
    if s.len() > 1 && s.starts_with('0') {
        return Err(malformed());
    }
    u64::from_str_radix(s, 16).map_err(|_| malformed())
}

/// Render a threshold the way the event type stores it: decimal strings on
/// inception, lowercase hex on rotation. This asymmetry is deliberate; keep
/// every encode and parse of a threshold going through these two helpers.
pub fn encode_threshold(ilk: Ilk, value: u64) -> String {
    match ilk {
        Ilk::Inception | Ilk::DelegatedInception => value.to_string(),
        _ => format!("{value:x}"),
    }
}

/// Parse a threshold field, keyed by event type.
pub fn parse_threshold(ilk: Ilk, s: &str) -> Result<u64, ValidationError> {
    let parsed = match ilk {
        Ilk::Inception | Ilk::DelegatedInception => s.parse::<u64>().ok(),
        _ => {
            if s.is_empty() || s.bytes().any(|b| b.is_ascii_uppercase()) {
                None
            } else {
                u64::from_str_radix(s, 16).ok()
            }
        }
    };
    parsed.ok_or_else(|| ValidationError::MalformedThreshold(s.to_string()))
}

/// Pre-rotation commitment over a set of next keys: the digest of the hex
/// next-threshold concatenated with the sorted qb64 keys, as a singleton
/// list. This kernel restricts rotations to the one-key, threshold-one case.
pub fn next_key_commitment(next_keys: &[String], next_threshold: u64) -> Vec<String> {
    let mut sorted: Vec<&str> = next_keys.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut data = format!("{next_threshold:x}");
    for key in sorted {
        data.push_str(key);
    }
    vec![Diger::digest(data.as_bytes()).qb64()]
}

/// Inception event (`icp`). Field order is canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inception {
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "t")]
    pub ilk: Ilk,
    #[serde(rename = "d")]
    pub said: String,
    #[serde(rename = "i")]
    pub prefix: String,
    #[serde(rename = "s")]
    pub sequence: String,
    #[serde(rename = "kt")]
    pub key_threshold: String,
    #[serde(rename = "k")]
    pub keys: Vec<String>,
    #[serde(rename = "nt")]
    pub next_threshold: String,
    #[serde(rename = "n")]
    pub next_keys: Vec<String>,
    #[serde(rename = "bt")]
    pub witness_threshold: String,
    #[serde(rename = "b")]
    pub witnesses: Vec<String>,
    #[serde(rename = "c")]
    pub config: Vec<String>,
    #[serde(rename = "a")]
    pub anchors: Vec<Value>,
}

/// Rotation event (`rot`). Field order is canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "t")]
    pub ilk: Ilk,
    #[serde(rename = "d")]
    pub said: String,
    #[serde(rename = "i")]
    pub prefix: String,
    #[serde(rename = "s")]
    pub sequence: String,
    #[serde(rename = "p")]
    pub prior: String,
    #[serde(rename = "kt")]
    pub key_threshold: String,
    #[serde(rename = "k")]
    pub keys: Vec<String>,
    #[serde(rename = "nt")]
    pub next_threshold: String,
    #[serde(rename = "n")]
    pub next_keys: Vec<String>,
    #[serde(rename = "bt")]
    pub witness_threshold: String,
    #[serde(rename = "br")]
    pub witness_cuts: Vec<String>,
    #[serde(rename = "ba")]
    pub witness_adds: Vec<String>,
    #[serde(rename = "a")]
    pub anchors: Vec<Value>,
}

/// Interaction event (`ixn`). Field order is canonical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "t")]
    pub ilk: Ilk,
    #[serde(rename = "d")]
    pub said: String,
    #[serde(rename = "i")]
    pub prefix: String,
    #[serde(rename = "s")]
    pub sequence: String,
    #[serde(rename = "p")]
    pub prior: String,
    #[serde(rename = "a")]
    pub anchors: Vec<Value>,
}

/// A key event, tagged by type.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Inception(Inception),
    Rotation(Rotation),
    Interaction(Interaction),
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Event::Inception(e) => e.serialize(serializer),
            Event::Rotation(e) => e.serialize(serializer),
            Event::Interaction(e) => e.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Event::from_value(value).map_err(serde::de::Error::custom)
    }
}

impl Event {
    /// Parse an event from its JSON value, dispatching on the `t` tag.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let tag = value
            .get("t")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingField("t"))?
            .to_string();

        match tag.as_str() {
            "icp" => serde_json::from_value(value)
                .map(Event::Inception)
                .map_err(|e| ValidationError::MalformedEvent(e.to_string())),
            "rot" => serde_json::from_value(value)
                .map(Event::Rotation)
                .map_err(|e| ValidationError::MalformedEvent(e.to_string())),
            "ixn" => serde_json::from_value(value)
                .map(Event::Interaction)
                .map_err(|e| ValidationError::MalformedEvent(e.to_string())),
            "dip" | "drt" => Err(ValidationError::UnsupportedEventType(tag)),
            _ => Err(ValidationError::UnknownEventType(tag)),
        }
    }

    /// Parse an event from raw canonical bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ValidationError::MalformedEvent(e.to_string()))?;
        Self::from_value(value)
    }

    /// The event type tag as recorded in the `t` field.
    pub fn ilk(&self) -> Ilk {
        match self {
            Event::Inception(e) => e.ilk,
            Event::Rotation(e) => e.ilk,
            Event::Interaction(e) => e.ilk,
        }
    }

    /// The self-addressing identifier (`d` field).
    pub fn said(&self) -> &str {
        match self {
            Event::Inception(e) => &e.said,
            Event::Rotation(e) => &e.said,
            Event::Interaction(e) => &e.said,
        }
    }

    /// The identifier prefix (`i` field).
    pub fn prefix(&self) -> &str {
        match self {
            Event::Inception(e) => &e.prefix,
            Event::Rotation(e) => &e.prefix,
            Event::Interaction(e) => &e.prefix,
        }
    }

    /// The raw sequence field (`s`).
    pub fn sequence_field(&self) -> &str {
        match self {
            Event::Inception(e) => &e.sequence,
            Event::Rotation(e) => &e.sequence,
            Event::Interaction(e) => &e.sequence,
        }
    }

    /// The parsed sequence number.
    pub fn sequence(&self) -> Result<u64, ValidationError> {
        parse_seq(self.sequence_field())
    }

    /// The prior-event digest (`p`), absent for inception.
    pub fn prior(&self) -> Option<&str> {
        match self {
            Event::Inception(_) => None,
            Event::Rotation(e) => Some(&e.prior),
            Event::Interaction(e) => Some(&e.prior),
        }
    }

    /// The version string (`v`).
    pub fn version(&self) -> &str {
        match self {
            Event::Inception(e) => &e.version,
            Event::Rotation(e) => &e.version,
            Event::Interaction(e) => &e.version,
        }
    }

    /// The canonical serialization: compact JSON in declared field order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Structural validation for a single event, independent of any log.
    pub fn validate(&self) -> Result<(), ValidationError> {
        deversify(self.version())?;

        match self {
            Event::Inception(e) => {
                if e.ilk != Ilk::Inception {
                    return Err(ValidationError::WrongEventType(e.ilk.to_string()));
                }
                if e.sequence != "0" {
                    return Err(ValidationError::InceptionSequenceNotZero(e.sequence.clone()));
                }
                let kt = parse_threshold(e.ilk, &e.key_threshold)?;
                if kt < 1 || kt as usize > e.keys.len() {
                    return Err(ValidationError::ThresholdExceedsKeys {
                        threshold: kt,
                        keys: e.keys.len(),
                    });
                }
                let nt = parse_threshold(e.ilk, &e.next_threshold)?;
                if nt as usize > e.next_keys.len() {
                    return Err(ValidationError::ThresholdExceedsKeys {
                        threshold: nt,
                        keys: e.next_keys.len(),
                    });
                }
                let bt = parse_threshold(e.ilk, &e.witness_threshold)?;
                if bt as usize > e.witnesses.len() {
                    return Err(ValidationError::InvalidWitnessThreshold {
                        threshold: bt,
                        witnesses: e.witnesses.len(),
                    });
                }
                if e.prefix != e.said {
                    return Err(ValidationError::PrefixDigestMismatch);
                }
                if e.said.is_empty() {
                    return Err(ValidationError::MissingField("d"));
                }
            }
            Event::Rotation(e) => {
                if e.ilk != Ilk::Rotation {
                    return Err(ValidationError::WrongEventType(e.ilk.to_string()));
                }
                let seq = parse_seq(&e.sequence)?;
                if seq == 0 {
                    return Err(ValidationError::SequenceMustBePositive { ilk: "rot" });
                }
                if e.prior.is_empty() {
                    return Err(ValidationError::MissingPriorDigest);
                }
                let kt = parse_threshold(e.ilk, &e.key_threshold)?;
                if kt < 1 || kt as usize > e.keys.len() {
                    return Err(ValidationError::ThresholdExceedsKeys {
                        threshold: kt,
                        keys: e.keys.len(),
                    });
                }
                let nt = parse_threshold(e.ilk, &e.next_threshold)?;
                if nt as usize > e.next_keys.len() {
                    return Err(ValidationError::ThresholdExceedsKeys {
                        threshold: nt,
                        keys: e.next_keys.len(),
                    });
                }
                parse_threshold(e.ilk, &e.witness_threshold)?;
                if e.said.is_empty() {
                    return Err(ValidationError::MissingField("d"));
                }
            }
            Event::Interaction(e) => {
                if e.ilk != Ilk::Interaction {
                    return Err(ValidationError::WrongEventType(e.ilk.to_string()));
                }
                let seq = parse_seq(&e.sequence)?;
                if seq == 0 {
                    return Err(ValidationError::SequenceMustBePositive { ilk: "ixn" });
                }
                if e.prior.is_empty() {
                    return Err(ValidationError::MissingPriorDigest);
                }
                if e.said.is_empty() {
                    return Err(ValidationError::MissingField("d"));
                }
            }
        }
        Ok(())
    }

    /// Recompute the SAID from the placeholder form and compare it with the
    /// recorded `d` field (and `i`, for inception).
    pub fn verify_said(&self) -> Result<(), ValidationError> {
        let expected = derive_said(self)?;
        if self.said() != expected {
            return Err(ValidationError::SaidMismatch {
                expected,
                got: self.said().to_string(),
            });
        }
        if let Event::Inception(e) = self {
            if e.prefix != e.said {
                return Err(ValidationError::PrefixDigestMismatch);
            }
        }
        Ok(())
    }
}

/// Digest the event with its self-addressing fields blanked, exactly as they
/// were when the SAID was first derived.
fn derive_said(event: &Event) -> Result<String, ValidationError> {
    let mut blank = event.clone();
    match &mut blank {
        Event::Inception(e) => {
            e.said.clear();
            e.prefix.clear();
        }
        Event::Rotation(e) => e.said.clear(),
        Event::Interaction(e) => e.said.clear(),
    }
    let bytes = blank.canonical_bytes()?;
    Ok(Diger::digest(&bytes).qb64())
}

/// Simple-majority default for witness thresholds.
fn ample(n: usize) -> u64 {
    if n == 0 {
        0
    } else {
        (n / 2 + 1) as u64
    }
}

/// Builder for inception events.
///
/// Takes the current signing keys and the next-keys commitment digests (see
/// [`next_key_commitment`]); derives the SAID and sets the identifier prefix
/// equal to it.
pub struct InceptionBuilder {
    keys: Vec<String>,
    key_threshold: u64,
    next_keys: Vec<String>,
    next_threshold: u64,
    witnesses: Vec<String>,
    witness_threshold: Option<u64>,
    config: Vec<String>,
    anchors: Vec<Value>,
}

impl InceptionBuilder {
    /// Start building with signing keys and next-keys commitment digests.
    pub fn new(keys: Vec<String>, next_keys: Vec<String>) -> Self {
        Self {
            keys,
            key_threshold: 1,
            next_keys,
            next_threshold: 1,
            witnesses: Vec::new(),
            witness_threshold: None,
            config: Vec::new(),
            anchors: Vec::new(),
        }
    }

    /// Set the signing threshold (default 1).
    pub fn key_threshold(mut self, kt: u64) -> Self {
        self.key_threshold = kt;
        self
    }

    /// Set the next-keys threshold (default 1).
    pub fn next_threshold(mut self, nt: u64) -> Self {
        self.next_threshold = nt;
        self
    }

    /// Set the witness identifier set.
    pub fn witnesses(mut self, witnesses: Vec<String>) -> Self {
        self.witnesses = witnesses;
        self
    }

    /// Set the witness-receipt threshold (default: simple majority).
    pub fn witness_threshold(mut self, bt: u64) -> Self {
        self.witness_threshold = Some(bt);
        self
    }

    /// Set the configuration trait list.
    pub fn config(mut self, config: Vec<String>) -> Self {
        self.config = config;
        self
    }

    /// Set the anchor list.
    pub fn anchors(mut self, anchors: Vec<Value>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Build the event, deriving its SAID and identifier prefix.
    pub fn build(self) -> Result<Inception, ValidationError> {
        if self.key_threshold < 1 || self.key_threshold as usize > self.keys.len() {
            return Err(ValidationError::ThresholdExceedsKeys {
                threshold: self.key_threshold,
                keys: self.keys.len(),
            });
        }
        if self.next_threshold as usize > self.next_keys.len() {
            return Err(ValidationError::ThresholdExceedsKeys {
                threshold: self.next_threshold,
                keys: self.next_keys.len(),
            });
        }

        let mut seen = HashSet::new();
        for witness in &self.witnesses {
            if !seen.insert(witness.as_str()) {
                return Err(ValidationError::DuplicateWitness(witness.clone()));
            }
        }

        let witness_threshold = self
            .witness_threshold
            .unwrap_or_else(|| ample(self.witnesses.len()));
        if self.witnesses.is_empty() {
            if witness_threshold != 0 {
                return Err(ValidationError::InvalidWitnessThreshold {
                    threshold: witness_threshold,
                    witnesses: 0,
                });
            }
        } else if witness_threshold < 1 || witness_threshold as usize > self.witnesses.len() {
            return Err(ValidationError::InvalidWitnessThreshold {
                threshold: witness_threshold,
                witnesses: self.witnesses.len(),
            });
        }

        let ilk = Ilk::Inception;
        let mut event = Inception {
            version: versify(0),
            ilk,
            said: String::new(),
            prefix: String::new(),
            sequence: "0".to_string(),
            key_threshold: encode_threshold(ilk, self.key_threshold),
            keys: self.keys,
            next_threshold: encode_threshold(ilk, self.next_threshold),
            next_keys: self.next_keys,
            witness_threshold: encode_threshold(ilk, witness_threshold),
            witnesses: self.witnesses,
            config: self.config,
            anchors: self.anchors,
        };

        let size = serialize_event(&event)?.len();
        event.version = versify(size);

        let placeholder = serialize_event(&event)?;
        let said = Diger::digest(&placeholder).qb64();
        event.prefix = said.clone();
        event.said = said;
        Ok(event)
    }
}

/// Builder for rotation events.
pub struct RotationBuilder {
    prefix: String,
    sequence: u64,
    prior: String,
    keys: Vec<String>,
    key_threshold: u64,
    next_keys: Vec<String>,
    next_threshold: u64,
    witness_threshold: u64,
    witness_cuts: Vec<String>,
    witness_adds: Vec<String>,
    anchors: Vec<Value>,
}

impl RotationBuilder {
    /// Start building a rotation at the given sequence with its prior digest,
    /// the new signing keys, and the new next-keys commitment digests.
    pub fn new(
        prefix: &str,
        sequence: u64,
        prior: &str,
        keys: Vec<String>,
        next_keys: Vec<String>,
    ) -> Self {
        Self {
            prefix: prefix.to_string(),
            sequence,
            prior: prior.to_string(),
            keys,
            key_threshold: 1,
            next_keys,
            next_threshold: 1,
            witness_threshold: 0,
            witness_cuts: Vec::new(),
            witness_adds: Vec::new(),
            anchors: Vec::new(),
        }
    }

    /// Set the signing threshold (default 1).
    pub fn key_threshold(mut self, kt: u64) -> Self {
        self.key_threshold = kt;
        self
    }

    /// Set the next-keys threshold (default 1).
    pub fn next_threshold(mut self, nt: u64) -> Self {
        self.next_threshold = nt;
        self
    }

    /// Set the post-rotation witness-receipt threshold.
    pub fn witness_threshold(mut self, bt: u64) -> Self {
        self.witness_threshold = bt;
        self
    }

    /// Set the witnesses to remove.
    pub fn witness_cuts(mut self, cuts: Vec<String>) -> Self {
        self.witness_cuts = cuts;
        self
    }

    /// Set the witnesses to add.
    pub fn witness_adds(mut self, adds: Vec<String>) -> Self {
        self.witness_adds = adds;
        self
    }

    /// Set the anchor list.
    pub fn anchors(mut self, anchors: Vec<Value>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Build the event, deriving its SAID.
    pub fn build(self) -> Result<Rotation, ValidationError> {
        if self.sequence == 0 {
            return Err(ValidationError::SequenceMustBePositive { ilk: "rot" });
        }
        if self.prior.is_empty() {
            return Err(ValidationError::MissingPriorDigest);
        }
        if self.key_threshold < 1 || self.key_threshold as usize > self.keys.len() {
            return Err(ValidationError::ThresholdExceedsKeys {
                threshold: self.key_threshold,
                keys: self.keys.len(),
            });
        }
        if self.next_threshold as usize > self.next_keys.len() {
            return Err(ValidationError::ThresholdExceedsKeys {
                threshold: self.next_threshold,
                keys: self.next_keys.len(),
            });
        }

        let ilk = Ilk::Rotation;
        let mut event = Rotation {
            version: versify(0),
            ilk,
            said: String::new(),
            prefix: self.prefix,
            sequence: seq_to_hex(self.sequence),
            prior: self.prior,
            key_threshold: encode_threshold(ilk, self.key_threshold),
            keys: self.keys,
            next_threshold: encode_threshold(ilk, self.next_threshold),
            next_keys: self.next_keys,
            witness_threshold: encode_threshold(ilk, self.witness_threshold),
            witness_cuts: self.witness_cuts,
            witness_adds: self.witness_adds,
            anchors: self.anchors,
        };

        let size = serialize_event(&event)?.len();
        event.version = versify(size);

        let placeholder = serialize_event(&event)?;
        event.said = Diger::digest(&placeholder).qb64();
        Ok(event)
    }
}

/// Builder for interaction events.
pub struct InteractionBuilder {
    prefix: String,
    sequence: u64,
    prior: String,
    anchors: Vec<Value>,
}

impl InteractionBuilder {
    /// Start building an interaction at the given sequence with its prior
    /// digest.
    pub fn new(prefix: &str, sequence: u64, prior: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            sequence,
            prior: prior.to_string(),
            anchors: Vec::new(),
        }
    }

    /// Set the anchor list.
    pub fn anchors(mut self, anchors: Vec<Value>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Build the event, deriving its SAID.
    pub fn build(self) -> Result<Interaction, ValidationError> {
        if self.sequence == 0 {
            return Err(ValidationError::SequenceMustBePositive { ilk: "ixn" });
        }
        if self.prior.is_empty() {
            return Err(ValidationError::MissingPriorDigest);
        }

        let mut event = Interaction {
            version: versify(0),
            ilk: Ilk::Interaction,
            said: String::new(),
            prefix: self.prefix,
            sequence: seq_to_hex(self.sequence),
            prior: self.prior,
            anchors: self.anchors,
        };

        let size = serialize_event(&event)?.len();
        event.version = versify(size);

        let placeholder = serialize_event(&event)?;
        event.said = Diger::digest(&placeholder).qb64();
        Ok(event)
    }
}

/// Compact-JSON serialization used by the two-pass SAID derivation: the
/// builders serialize once to learn the size for the version string, then
/// again to produce the placeholder form that gets digested.
fn serialize_event<T: Serialize>(event: &T) -> Result<Vec<u8>, ValidationError> {
    serde_json::to_vec(event).map_err(|e| CoreError::Serialization(e.to_string()).into())
}
