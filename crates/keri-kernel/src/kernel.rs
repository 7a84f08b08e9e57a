//! The Kernel: unified API for the KERI identifier engine.
//!
//! The Kernel composes signers, the event builders, and a Key Event Log into
//! single transactional operations: create an identifier, rotate its keys,
//! anchor data with an interaction, verify and export its log. Each
//! operation propagates the first error and never partially commits; the log
//! itself is the gatekeeper.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use keri_kernel_core::{
    build_key_state, next_key_commitment, rotate_witnesses, verify_chain, Diger, Event,
    InceptionBuilder, InteractionBuilder, KeyState, RotationBuilder, Signature, Signer,
};
use keri_kernel_store::{EventRange, KelStats, KelStore, LogEntry, MemoryKel};

use crate::error::{KernelError, Result};
use crate::export::{ExportedEntry, ExportedKeyState, IdentifierExport, EXPORT_VERSION};

/// Options for creating an identifier.
#[derive(Debug, Clone, Default)]
pub struct InceptOpts {
    /// Witness identifiers for the new prefix.
    pub witnesses: Vec<String>,
    /// Witness-receipt threshold; defaults to a simple majority.
    pub witness_threshold: Option<u64>,
    /// Configuration traits (e.g. `"EO"` for establishment-only).
    pub config: Vec<String>,
}

/// Options for rotating keys.
#[derive(Debug, Clone, Default)]
pub struct RotateOpts {
    /// Witnesses to remove.
    pub witness_cuts: Vec<String>,
    /// Witnesses to add.
    pub witness_adds: Vec<String>,
    /// Post-rotation witness threshold. Defaults to the prior threshold when
    /// the witness set is unchanged, or a simple majority of the new set.
    pub witness_threshold: Option<u64>,
    /// Anchors to carry on the rotation event.
    pub anchors: Vec<Value>,
}

/// Snapshot of a freshly created identifier.
#[derive(Debug, Clone)]
pub struct Aid {
    /// The self-certifying prefix (equal to the inception event's SAID).
    pub prefix: String,
    /// Key state right after inception.
    pub state: KeyState,
}

/// The main Kernel struct, generic over its log backend.
pub struct Kernel<S: KelStore> {
    store: Arc<S>,
}

impl Kernel<MemoryKel> {
    /// Kernel over a fresh in-memory log.
    pub fn in_memory() -> Self {
        Self::new(MemoryKel::new())
    }
}

impl<S: KelStore> Kernel<S> {
    /// Create a kernel over the given log backend.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// The underlying log.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identifier Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a new identifier by inception.
    ///
    /// The next-keys commitment binds `next_signer`'s public key, so the
    /// first rotation must reveal exactly that key.
    pub async fn create_identifier(
        &self,
        signer: &Signer,
        next_signer: &Signer,
        opts: InceptOpts,
    ) -> Result<Aid> {
        let pubkey = signer.verfer().qb64();
        let next_pubkey = next_signer.verfer().qb64();
        let commitment = next_key_commitment(&[next_pubkey], 1);

        let mut builder = InceptionBuilder::new(vec![pubkey], commitment)
            .witnesses(opts.witnesses)
            .config(opts.config);
        if let Some(bt) = opts.witness_threshold {
            builder = builder.witness_threshold(bt);
        }
        let inception = builder.build()?;

        let prefix = inception.prefix.clone();
        let event = Event::Inception(inception);
        let signature = signer.sign(&event.canonical_bytes()?);

        self.store.append(&prefix, event, vec![signature]).await?;
        let state = self.key_state(&prefix).await?;

        debug!(%prefix, "identifier created");
        Ok(Aid { prefix, state })
    }

    /// Rotate an identifier's keys.
    ///
    /// `new_signer` must hold the key committed by the previous
    /// establishment event; `next_signer` seeds the next commitment. The
    /// serialized rotation is signed by `current_signer`.
    pub async fn rotate_keys(
        &self,
        prefix: &str,
        current_signer: &Signer,
        new_signer: &Signer,
        next_signer: &Signer,
        opts: RotateOpts,
    ) -> Result<KeyState> {
        let state = self.key_state(prefix).await?;

        let new_pubkey = new_signer.verfer().qb64();
        let next_pubkey = next_signer.verfer().qb64();
        let commitment = next_key_commitment(&[next_pubkey], 1);

        let witness_threshold = match opts.witness_threshold {
            Some(bt) => bt,
            None if opts.witness_cuts.is_empty() && opts.witness_adds.is_empty() => {
                state.witness_threshold
            }
            None => {
                let rotated =
                    rotate_witnesses(&state.witnesses, &opts.witness_cuts, &opts.witness_adds);
                majority(rotated.len())
            }
        };

        let rotation = RotationBuilder::new(
            prefix,
            state.sequence + 1,
            &state.digest,
            vec![new_pubkey],
            commitment,
        )
        .witness_threshold(witness_threshold)
        .witness_cuts(opts.witness_cuts)
        .witness_adds(opts.witness_adds)
        .anchors(opts.anchors)
        .build()?;

        // Check the pre-rotation commitment before anything reaches the log.
        let next_state = state.apply_rotation(&rotation)?;

        let event = Event::Rotation(rotation);
        let signature = current_signer.sign(&event.canonical_bytes()?);
        self.store.append(prefix, event, vec![signature]).await?;

        debug!(%prefix, sequence = next_state.sequence, "keys rotated");
        Ok(next_state)
    }

    /// Anchor data with an interaction event. Keys, thresholds, and
    /// witnesses are untouched.
    pub async fn create_interaction(
        &self,
        prefix: &str,
        signer: &Signer,
        anchors: Vec<Value>,
    ) -> Result<KeyState> {
        let state = self.key_state(prefix).await?;
        if state.establishment_only {
            return Err(KernelError::EstablishmentOnly);
        }

        let interaction = InteractionBuilder::new(prefix, state.sequence + 1, &state.digest)
            .anchors(anchors)
            .build()?;
        let next_state = state.apply_interaction(&interaction)?;

        let event = Event::Interaction(interaction);
        let signature = signer.sign(&event.canonical_bytes()?);
        self.store.append(prefix, event, vec![signature]).await?;

        debug!(%prefix, sequence = next_state.sequence, "interaction anchored");
        Ok(next_state)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Rebuild the current key state by replaying the prefix's log.
    pub async fn key_state(&self, prefix: &str) -> Result<KeyState> {
        let events = self.ordered_events(prefix).await?;
        Ok(build_key_state(&events)?)
    }

    /// Replay the prefix's log and check its chain integrity.
    pub async fn verify_identifier(&self, prefix: &str) -> Result<()> {
        let events = self.ordered_events(prefix).await?;
        verify_chain(&events)?;
        Ok(())
    }

    /// Ordered log entries for a prefix, filtered by the inclusive range.
    pub async fn get_events(&self, prefix: &str, range: EventRange) -> Result<Vec<LogEntry>> {
        Ok(self.store.events(prefix, range).await?)
    }

    /// Highest stored sequence for a prefix.
    pub async fn current_sequence(&self, prefix: &str) -> Result<u64> {
        self.store
            .head(prefix)
            .await?
            .ok_or_else(|| KernelError::UnknownPrefix(prefix.to_string()))
    }

    /// BLAKE3-256 digest of arbitrary bytes, in CESR text form.
    pub fn digest(&self, data: &[u8]) -> String {
        Diger::digest(data).qb64()
    }

    /// Aggregate log counters.
    pub async fn stats(&self) -> Result<KelStats> {
        Ok(self.store.stats().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Receipt Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach witness receipts to a stored entry. Receipts are stored
    /// opaquely and deduplicated, never verified.
    pub async fn add_receipts(
        &self,
        prefix: &str,
        sequence: u64,
        receipts: Vec<Value>,
    ) -> Result<()> {
        Ok(self.store.add_receipts(prefix, sequence, receipts).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export / Import
    // ─────────────────────────────────────────────────────────────────────────

    /// Export a prefix's full log and key-state summary.
    pub async fn export_identifier(&self, prefix: &str) -> Result<IdentifierExport> {
        let entries = self.store.events(prefix, EventRange::default()).await?;
        if entries.is_empty() {
            return Err(KernelError::UnknownPrefix(prefix.to_string()));
        }

        let events: Vec<Event> = entries.iter().map(|entry| entry.event.clone()).collect();
        let state = build_key_state(&events)?;

        Ok(IdentifierExport {
            version: EXPORT_VERSION.to_string(),
            prefix: prefix.to_string(),
            exported_at: chrono::Utc::now(),
            key_state: ExportedKeyState::from(&state),
            events: entries.iter().map(ExportedEntry::from).collect(),
        })
    }

    /// Clear the prefix and re-append the exported events in order.
    ///
    /// The first rejected event halts the import and propagates; earlier
    /// entries stay appended. Callers that need all-or-nothing semantics
    /// clear the prefix on failure.
    pub async fn import_identifier(&self, export: &IdentifierExport) -> Result<KeyState> {
        if export.version != EXPORT_VERSION {
            return Err(KernelError::UnsupportedExportVersion(export.version.clone()));
        }

        self.store.clear(&export.prefix).await?;

        for entry in &export.events {
            let mut signatures = Vec::with_capacity(entry.signatures.len());
            for encoded in &entry.signatures {
                let bytes = STANDARD
                    .decode(encoded)
                    .map_err(|e| KernelError::InvalidSignatureEncoding(e.to_string()))?;
                let signature = Signature::from_slice(&bytes)
                    .map_err(|e| KernelError::InvalidSignatureEncoding(e.to_string()))?;
                signatures.push(signature);
            }

            self.store
                .append(&export.prefix, entry.event.clone(), signatures)
                .await?;

            if !entry.receipts.is_empty() {
                self.store
                    .add_receipts(&export.prefix, entry.sequence, entry.receipts.clone())
                    .await?;
            }
        }

        debug!(prefix = %export.prefix, events = export.events.len(), "identifier imported");
        self.key_state(&export.prefix).await
    }

    /// Destructively remove a prefix's entries and head index.
    pub async fn clear(&self, prefix: &str) -> Result<()> {
        Ok(self.store.clear(prefix).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn ordered_events(&self, prefix: &str) -> Result<Vec<Event>> {
        let entries = self.store.events(prefix, EventRange::default()).await?;
        if entries.is_empty() {
            return Err(KernelError::UnknownPrefix(prefix.to_string()));
        }
        Ok(entries.into_iter().map(|entry| entry.event).collect())
    }
}

/// Simple-majority threshold for a witness set.
fn majority(n: usize) -> u64 {
    if n == 0 {
        0
    } else {
        (n / 2 + 1) as u64
    }
}
