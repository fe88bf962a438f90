//! Retention pruning that keeps the chain verifiable.
//!
//! Only a contiguous prefix of the chain is ever deleted: the walk starts at
//! the oldest retained entry and stops at the first one its retention class
//! still protects.  A seven-year financial entry therefore also shields every
//! later standard entry until it expires itself, which keeps the retained
//! window free of sequence gaps.
//!
//! The checkpoint for the boundary is written before anything is deleted.
//! If the delete then fails, the checkpoint merely sits ahead of a few
//! surviving old entries and the verifier, which starts after the
//! checkpoint, still passes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use sealgate_contracts::{
    audit::{AuditLogEntry, ChainCheckpoint},
    error::SealgateResult,
    retention::RetentionPolicy,
};
use sealgate_core::{
    traits::{AuditStore, Clock},
    SystemClock,
};

/// Entries fetched per range scan.
pub const DEFAULT_PRUNE_BATCH: u64 = 500;

/// Deletes expired entries from the head of the chain.
pub struct RetentionPruner {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    batch_size: u64,
}

impl RetentionPruner {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            batch_size: DEFAULT_PRUNE_BATCH,
        }
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Delete the expired prefix of the chain.  Returns the number deleted.
    ///
    /// Entries appended after the call starts are never considered.
    pub fn prune(&self, policy: &RetentionPolicy) -> SealgateResult<usize> {
        let now = self.clock.now();
        let Some(last) = self.store.find_last()? else {
            debug!("audit chain empty, nothing to prune");
            return Ok(0);
        };

        let Some(boundary) = self.find_boundary(policy, now, last.sequence)? else {
            debug!("no expired entries at head of chain");
            return Ok(0);
        };

        self.store.upsert_checkpoint(&ChainCheckpoint {
            sequence: boundary.sequence,
            hash: boundary.current_hash.clone(),
            created_at: now,
        })?;

        let deleted = self.store.delete_older_than(boundary.sequence)?;

        info!(
            deleted,
            checkpoint_sequence = boundary.sequence,
            "audit retention pruning complete"
        );
        Ok(deleted)
    }

    /// The newest entry of the longest expired, gap-free prefix.
    fn find_boundary(
        &self,
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
        last_sequence: u64,
    ) -> SealgateResult<Option<AuditLogEntry>> {
        let mut next = match self.store.latest_checkpoint()? {
            Some(checkpoint) => checkpoint.sequence + 1,
            None => 1,
        };
        let mut boundary: Option<AuditLogEntry> = None;

        while next <= last_sequence {
            let to = next.saturating_add(self.batch_size - 1).min(last_sequence);
            let batch = self.store.find_range(next, to)?;

            for entry in batch {
                if entry.sequence != next || !expired(policy, &entry, now) {
                    return Ok(boundary);
                }
                next = entry.sequence + 1;
                boundary = Some(entry);
            }

            if next <= to {
                // Short batch: a gap in the store.
                break;
            }
        }

        Ok(boundary)
    }
}

fn expired(policy: &RetentionPolicy, entry: &AuditLogEntry, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(entry.timestamp) > policy.max_age_for(&entry.action)
}
