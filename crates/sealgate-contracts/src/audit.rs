//! Audit record, chain entry, checkpoint, and verification report types.
//!
//! `AuditRecord` is what a business handler hands to the appender.
//! `AuditLogEntry` is what the appender persists: the redacted record plus
//! its position in the chain and the two hashes that make edits detectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The `previous_hash` of the first entry of an empty chain.
///
/// 64 hex zeros; also the anchor hash at sequence 0 before any checkpoint
/// exists.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// The outcome a handler wants recorded.
///
/// `details` may contain sensitive keys; the appender redacts them before
/// hashing and storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditRecord {
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            details: serde_json::Value::Object(serde_json::Map::new()),
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// One link of the persisted hash chain.
///
/// Immutable once written.  Only the retention pruner removes entries, and
/// only after anchoring the boundary in a `ChainCheckpoint`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Position in the chain, starting at 1, no gaps.
    pub sequence: u64,
    /// Commit time at millisecond precision.
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    /// Redacted details.
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// `current_hash` of the predecessor, or `GENESIS_HASH`.
    pub previous_hash: String,
    /// SHA-256 (hex) of `previous_hash` followed by the canonical entry body.
    pub current_hash: String,
}

/// A retained `(sequence, hash)` pair marking a pruning boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCheckpoint {
    /// Sequence of the last pruned entry.
    pub sequence: u64,
    /// That entry's `current_hash`.
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

/// Classification of a single verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainErrorKind {
    /// Stored `current_hash` differs from the recomputed value.
    HashMismatch,
    /// Stored `previous_hash` differs from the predecessor's hash.
    LinkMismatch,
    /// A sequence number is missing between two retained entries.
    SequenceGap,
    /// Reported because an earlier link in the window already failed.
    Downstream,
}

/// One mismatch found by the chain verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainError {
    pub sequence: u64,
    pub expected: String,
    pub actual: String,
    pub kind: ChainErrorKind,
}

/// Result of one verification pass.
///
/// Mismatches are data: the verifier returns them here rather than as an
/// `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub valid: bool,
    pub checked_count: u64,
    /// Sequence the walk was anchored at (0 for genesis).
    pub anchor_sequence: u64,
    pub errors: Vec<ChainError>,
}

impl ChainReport {
    /// The sequence of the first failure, if any.
    pub fn first_error(&self) -> Option<u64> {
        self.errors.first().map(|e| e.sequence)
    }
}
