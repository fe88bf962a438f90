//! Periodic chain verification.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sealgate_contracts::{
    audit::{ChainReport, GENESIS_HASH},
    error::{SealgateError, SealgateResult},
};
use sealgate_core::traits::AuditStore;

use crate::chain::verify_entries;

/// Recomputes stored hashes to detect edits made outside the appender.
pub struct ChainVerifier {
    store: Arc<dyn AuditStore>,
}

impl ChainVerifier {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Verify up to `limit` of the most recent entries.
    ///
    /// The walk is anchored at the latest checkpoint (or genesis), re-read
    /// after fetching in case a concurrent prune moved it, and only covers
    /// entries committed when the call started; appends that land
    /// during the walk are left for the next run.  When the chain since the
    /// anchor is longer than `limit`, the stored hash of the entry just
    /// before the window seeds the walk.
    ///
    /// Mismatches are reported in the returned `ChainReport`.  `Err` means
    /// the store could not be read.
    pub fn verify(&self, limit: usize) -> SealgateResult<ChainReport> {
        let (anchor_sequence, anchor_hash) = match self.store.latest_checkpoint()? {
            Some(checkpoint) => (checkpoint.sequence, checkpoint.hash),
            None => (0, GENESIS_HASH.to_string()),
        };

        let last = match self.store.find_last()? {
            Some(entry) if entry.sequence > anchor_sequence && limit > 0 => entry.sequence,
            _ => {
                debug!(anchor_sequence, "nothing to verify");
                return Ok(ChainReport {
                    valid: true,
                    checked_count: 0,
                    anchor_sequence,
                    errors: Vec::new(),
                });
            }
        };

        let first = anchor_sequence + 1;
        let window_start = last.saturating_sub(limit as u64 - 1).max(first);

        let (walk_anchor, walk_hash, entries) = if window_start > first {
            let mut fetched = self.store.find_range(window_start - 1, last)?;
            match fetched.first() {
                Some(pred) if pred.sequence == window_start - 1 => {
                    let hash = pred.current_hash.clone();
                    fetched.remove(0);
                    (window_start - 1, hash, fetched)
                }
                // The predecessor is gone; the walk will flag the gap.
                _ => (window_start - 1, String::new(), fetched),
            }
        } else {
            (anchor_sequence, anchor_hash, self.store.find_range(first, last)?)
        };

        // A prune that committed after the first checkpoint read has already
        // deleted the head of the fetched range.  Re-anchor on its checkpoint
        // so truncation is never reported as tampering.
        let (walk_anchor, walk_hash, entries) = match self.store.latest_checkpoint()? {
            Some(checkpoint)
                if checkpoint.sequence > anchor_sequence && checkpoint.sequence >= walk_anchor =>
            {
                debug!(
                    checkpoint_sequence = checkpoint.sequence,
                    "checkpoint advanced during verification, re-anchoring"
                );
                let retained: Vec<_> = entries
                    .into_iter()
                    .filter(|e| e.sequence > checkpoint.sequence)
                    .collect();
                (checkpoint.sequence, checkpoint.hash, retained)
            }
            _ => (walk_anchor, walk_hash, entries),
        };

        let errors = verify_entries(walk_anchor, &walk_hash, &entries);
        let report = ChainReport {
            valid: errors.is_empty(),
            checked_count: entries.len() as u64,
            anchor_sequence: walk_anchor,
            errors,
        };

        if report.valid {
            info!(
                checked = report.checked_count,
                anchor_sequence = report.anchor_sequence,
                last_sequence = last,
                "audit chain verified"
            );
        } else {
            warn!(
                checked = report.checked_count,
                first_error = report.first_error().unwrap_or_default(),
                error_count = report.errors.len(),
                "audit chain verification found mismatches"
            );
        }

        Ok(report)
    }
}

/// Convert a failed report into `SealgateError::ChainIntegrityViolation`.
///
/// Returns `None` for a valid report.
pub fn violation(report: &ChainReport) -> Option<SealgateError> {
    let first = report.errors.first()?;
    Some(SealgateError::ChainIntegrityViolation {
        sequence: first.sequence,
        reason: format!(
            "{:?}: expected {}, found {} ({} entries affected)",
            first.kind,
            first.expected,
            first.actual,
            report.errors.len()
        ),
    })
}
