//! Audit journal for authorization events
//!
//! Every successful mutation (and every rolled-back execution) is appended as
//! a [`JournalEntry`] whose BLAKE3 hash binds the previous entry's hash, so
//! any rewrite of history breaks the chain.

use blake3::Hasher;
use quorumvault_core::{ActionId, Amount, Identity};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Hash used as `prev_hash` of the first entry
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// Journal verification errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JournalError {
    #[error("Sequence number violation: expected {expected}, got {actual}")]
    SequenceViolation { expected: u64, actual: u64 },

    #[error("Chain broken at seq_no {seq_no}: {reason}")]
    ChainBroken { seq_no: u64, reason: String },
}

/// State transition recorded by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthorizationEvent {
    Submitted {
        action_id: ActionId,
        owner: Identity,
        target: Identity,
        #[serde(with = "decimal_amount")]
        amount: Amount,
        #[serde(with = "hex::serde")]
        payload: Vec<u8>,
    },
    Confirmed {
        action_id: ActionId,
        owner: Identity,
        confirmations: usize,
    },
    Revoked {
        action_id: ActionId,
        owner: Identity,
        confirmations: usize,
    },
    Executed {
        action_id: ActionId,
        owner: Identity,
        target: Identity,
        #[serde(with = "decimal_amount")]
        amount: Amount,
    },
    ExecutionFailed {
        action_id: ActionId,
        owner: Identity,
        reason: String,
    },
}

impl AuthorizationEvent {
    pub fn action_id(&self) -> ActionId {
        match self {
            AuthorizationEvent::Submitted { action_id, .. }
            | AuthorizationEvent::Confirmed { action_id, .. }
            | AuthorizationEvent::Revoked { action_id, .. }
            | AuthorizationEvent::Executed { action_id, .. }
            | AuthorizationEvent::ExecutionFailed { action_id, .. } => *action_id,
        }
    }

    /// Short event name, as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AuthorizationEvent::Submitted { .. } => "submitted",
            AuthorizationEvent::Confirmed { .. } => "confirmed",
            AuthorizationEvent::Revoked { .. } => "revoked",
            AuthorizationEvent::Executed { .. } => "executed",
            AuthorizationEvent::ExecutionFailed { .. } => "execution_failed",
        }
    }

    fn digest_into(&self, hasher: &mut Hasher) {
        hasher.update(self.name().as_bytes());
        hasher.update(&self.action_id().to_le_bytes());
        match self {
            AuthorizationEvent::Submitted {
                owner,
                target,
                amount,
                payload,
                ..
            } => {
                update_str(hasher, owner.as_str());
                update_str(hasher, target.as_str());
                hasher.update(&amount.to_le_bytes());
                hasher.update(&(payload.len() as u64).to_le_bytes());
                hasher.update(payload);
            }
            AuthorizationEvent::Confirmed {
                owner,
                confirmations,
                ..
            }
            | AuthorizationEvent::Revoked {
                owner,
                confirmations,
                ..
            } => {
                update_str(hasher, owner.as_str());
                hasher.update(&(*confirmations as u64).to_le_bytes());
            }
            AuthorizationEvent::Executed {
                owner,
                target,
                amount,
                ..
            } => {
                update_str(hasher, owner.as_str());
                update_str(hasher, target.as_str());
                hasher.update(&amount.to_le_bytes());
            }
            AuthorizationEvent::ExecutionFailed { owner, reason, .. } => {
                update_str(hasher, owner.as_str());
                update_str(hasher, reason);
            }
        }
    }
}

/// Amounts travel as decimal strings: internally tagged enums are buffered
/// by serde, and that buffer has no `u128` support.
mod decimal_amount {
    use quorumvault_core::Amount;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse()
            .map_err(|e| D::Error::custom(format!("invalid amount {raw:?}: {e}")))
    }
}

/// Length-prefixed so adjacent fields cannot run together
fn update_str(hasher: &mut Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// One hash-chained journal record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, starting at 1
    pub seq_no: u64,
    /// Append time (Unix milliseconds)
    pub timestamp_ms: u64,
    pub event: AuthorizationEvent,
    /// Hex BLAKE3 hash of the previous entry
    pub prev_hash: String,
    /// Hex BLAKE3 hash of this entry
    pub entry_hash: String,
}

impl JournalEntry {
    fn compute_hash(
        seq_no: u64,
        timestamp_ms: u64,
        event: &AuthorizationEvent,
        prev_hash: &[u8; 32],
    ) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(&seq_no.to_le_bytes());
        hasher.update(&timestamp_ms.to_le_bytes());
        hasher.update(prev_hash);
        event.digest_into(&mut hasher);
        *hasher.finalize().as_bytes()
    }
}

/// Append-only, in-memory event journal
#[derive(Debug, Default)]
pub struct AuditJournal {
    entries: Vec<JournalEntry>,
    last_hash: Option<[u8; 32]>,
}

impl AuditJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event; returns its sequence number
    pub fn append(&mut self, event: AuthorizationEvent) -> u64 {
        let seq_no = self.entries.len() as u64 + 1;
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let prev = self.last_hash.unwrap_or(GENESIS_HASH);
        let hash = JournalEntry::compute_hash(seq_no, timestamp_ms, &event, &prev);

        self.entries.push(JournalEntry {
            seq_no,
            timestamp_ms,
            event,
            prev_hash: hex::encode(prev),
            entry_hash: hex::encode(hash),
        });
        self.last_hash = Some(hash);
        seq_no
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hex hash of the newest entry
    pub fn head_hash(&self) -> Option<String> {
        self.last_hash.map(hex::encode)
    }

    /// Recompute the whole chain
    pub fn verify_chain(&self) -> Result<(), JournalError> {
        verify_entries(&self.entries)
    }
}

/// Verify a sequence of entries, e.g. one exported from a journal
pub fn verify_entries(entries: &[JournalEntry]) -> Result<(), JournalError> {
    let mut prev = GENESIS_HASH;
    for (position, entry) in entries.iter().enumerate() {
        let expected = position as u64 + 1;
        if entry.seq_no != expected {
            return Err(JournalError::SequenceViolation {
                expected,
                actual: entry.seq_no,
            });
        }

        if entry.prev_hash != hex::encode(prev) {
            return Err(JournalError::ChainBroken {
                seq_no: entry.seq_no,
                reason: "prev_hash does not match previous entry".to_string(),
            });
        }

        let hash = JournalEntry::compute_hash(entry.seq_no, entry.timestamp_ms, &entry.event, &prev);
        if entry.entry_hash != hex::encode(hash) {
            return Err(JournalError::ChainBroken {
                seq_no: entry.seq_no,
                reason: "entry_hash does not match contents".to_string(),
            });
        }
        prev = hash;
    }
    Ok(())
}
