//! The single-writer audit appender.
//!
//! Appending is read-modify-write on the chain tail: read the last committed
//! entry, link to its hash, insert.  Two appends racing through that
//! sequence would both link to the same predecessor, so `append` holds a
//! process-local mutex for the whole operation.  Across processes the
//! store's own "next sequence only" insert rule rejects the loser.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use sealgate_contracts::{
    audit::{AuditLogEntry, AuditRecord, GENESIS_HASH},
    error::{SealgateError, SealgateResult},
};
use sealgate_core::{
    clock::truncate_to_millis,
    traits::{AuditStore, Clock},
    SystemClock,
};

use crate::{chain::hash_entry, redact::Redactor};

/// Redacts, links, hashes, and persists audit records.
pub struct AuditAppender {
    store: Arc<dyn AuditStore>,
    clock: Arc<dyn Clock>,
    redactor: Redactor,
    write_lock: Mutex<()>,
}

impl AuditAppender {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn AuditStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            redactor: Redactor::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Replace the default redactor.
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Append one record to the chain and return the committed entry.
    ///
    /// `details` is redacted before hashing, so the stored and hashed forms
    /// agree and secrets never reach the store.  If the store rejects the
    /// insert the chain is unchanged and the error is returned.
    pub fn append(&self, record: AuditRecord) -> SealgateResult<AuditLogEntry> {
        let _guard = self.write_lock.lock().map_err(|e| SealgateError::Persistence {
            reason: format!("audit write lock poisoned: {}", e),
        })?;

        let (last_sequence, previous_hash) = self.tail()?;

        let mut entry = AuditLogEntry {
            sequence: last_sequence + 1,
            timestamp: truncate_to_millis(self.clock.now()),
            actor_id: record.actor_id,
            action: record.action,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            details: self.redactor.redact(&record.details),
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            previous_hash,
            current_hash: String::new(),
        };
        entry.current_hash = hash_entry(&entry, &entry.previous_hash);

        if let Err(e) = self.store.insert(&entry) {
            warn!(
                sequence = entry.sequence,
                action = %entry.action,
                error = %e,
                "audit append failed"
            );
            return Err(e);
        }

        info!(
            sequence = entry.sequence,
            actor_id = %entry.actor_id,
            action = %entry.action,
            entity = %format!("{}/{}", entry.entity_type, entry.entity_id),
            "audit entry appended"
        );

        Ok(entry)
    }

    /// `(sequence, hash)` the next entry links to.
    ///
    /// Falls back to the latest checkpoint when pruning has removed every
    /// entry, and to genesis for a brand-new chain.
    fn tail(&self) -> SealgateResult<(u64, String)> {
        if let Some(last) = self.store.find_last()? {
            return Ok((last.sequence, last.current_hash));
        }
        if let Some(checkpoint) = self.store.latest_checkpoint()? {
            debug!(
                sequence = checkpoint.sequence,
                "chain empty after pruning, linking to checkpoint"
            );
            return Ok((checkpoint.sequence, checkpoint.hash));
        }
        Ok((0, GENESIS_HASH.to_string()))
    }
}
