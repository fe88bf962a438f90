//! Hash-chain primitives: entry hashing and range verification.
//!
//! Hash input layout (bytes, in order):
//!   1. previous_hash as UTF-8 bytes (64 ASCII hex chars)
//!   2. canonical JSON of the entry body, i.e. every field except the two
//!      hashes, with the timestamp as RFC 3339 UTC at millisecond precision
//!
//! Every field that contributes to the hash is listed in `entry_body` so
//! nothing is accidentally omitted.

use chrono::SecondsFormat;
use serde_json::json;
use sha2::{Digest, Sha256};

use sealgate_contracts::audit::{AuditLogEntry, ChainError, ChainErrorKind};
use sealgate_core::canonical_json;

/// The hashed portion of an entry, as JSON.
pub fn entry_body(entry: &AuditLogEntry) -> serde_json::Value {
    json!({
        "sequence": entry.sequence,
        "timestamp": entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        "actor_id": entry.actor_id,
        "action": entry.action,
        "entity_type": entry.entity_type,
        "entity_id": entry.entity_id,
        "details": entry.details,
        "ip_address": entry.ip_address,
        "user_agent": entry.user_agent,
    })
}

/// Compute `current_hash` for `entry` chained onto `previous_hash`.
///
/// The entry's own `previous_hash`/`current_hash` fields are ignored, so the
/// verifier can recompute from the running hash rather than trusting the
/// stored link.  Returns a lowercase 64-character hex string.
pub fn hash_entry(entry: &AuditLogEntry, previous_hash: &str) -> String {
    let body = canonical_json(&entry_body(entry));

    let mut hasher = Sha256::new();
    hasher.update(previous_hash.as_bytes());
    hasher.update(body.as_bytes());

    hex::encode(hasher.finalize())
}

/// Walk `entries` (ascending) from an anchor and collect every failure.
///
/// For each entry, in order:
///
/// 1. **Continuity**: `sequence` is exactly one past its predecessor.
/// 2. **Linkage**: stored `previous_hash` equals the running hash.
/// 3. **Hash correctness**: stored `current_hash` equals the value
///    recomputed from the entry's fields and the running hash.
///
/// The running hash always advances to the recomputed value.  Once one
/// entry fails, every later entry in the slice is reported as
/// `Downstream`, since a broken link invalidates everything after it.
/// An empty slice yields no errors.
pub fn verify_entries(
    anchor_sequence: u64,
    anchor_hash: &str,
    entries: &[AuditLogEntry],
) -> Vec<ChainError> {
    let mut errors = Vec::new();
    let mut running = anchor_hash.to_string();
    let mut expected_sequence = anchor_sequence + 1;
    let mut broken = false;

    for entry in entries {
        let recomputed = hash_entry(entry, &running);

        let failure = if broken {
            Some(ChainError {
                sequence: entry.sequence,
                expected: recomputed.clone(),
                actual: entry.current_hash.clone(),
                kind: ChainErrorKind::Downstream,
            })
        } else if entry.sequence != expected_sequence {
            Some(ChainError {
                sequence: entry.sequence,
                expected: expected_sequence.to_string(),
                actual: entry.sequence.to_string(),
                kind: ChainErrorKind::SequenceGap,
            })
        } else if entry.previous_hash != running {
            Some(ChainError {
                sequence: entry.sequence,
                expected: running.clone(),
                actual: entry.previous_hash.clone(),
                kind: ChainErrorKind::LinkMismatch,
            })
        } else if entry.current_hash != recomputed {
            Some(ChainError {
                sequence: entry.sequence,
                expected: recomputed.clone(),
                actual: entry.current_hash.clone(),
                kind: ChainErrorKind::HashMismatch,
            })
        } else {
            None
        };

        if let Some(error) = failure {
            broken = true;
            errors.push(error);
        }

        running = recomputed;
        expected_sequence = entry.sequence + 1;
    }

    errors
}
