//! In-memory implementation of `AuditStore`.
//!
//! `InMemoryAuditStore` is the reference persistence collaborator.  Entries
//! and checkpoints live in `BTreeMap`s keyed by sequence behind one `Mutex`,
//! which gives ordered range scans for free and lets `insert` enforce the
//! "next sequence only" rule atomically.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use sealgate_contracts::{
    audit::{AuditLogEntry, ChainCheckpoint},
    error::{SealgateError, SealgateResult},
};
use sealgate_core::traits::AuditStore;

// ── Internal mutable state ────────────────────────────────────────────────────

#[derive(Default)]
struct StoreState {
    entries: BTreeMap<u64, AuditLogEntry>,
    checkpoints: BTreeMap<u64, ChainCheckpoint>,
}

impl StoreState {
    /// The only sequence `insert` will accept next.
    fn next_sequence(&self) -> u64 {
        let after_entries = self.entries.keys().next_back().copied();
        let after_checkpoint = self.checkpoints.keys().next_back().copied();
        after_entries.max(after_checkpoint).unwrap_or(0) + 1
    }
}

// ── Public store ──────────────────────────────────────────────────────────────

/// An in-memory audit store.  Cheap to construct; share it behind an `Arc`.
#[derive(Default)]
pub struct InMemoryAuditStore {
    state: Mutex<StoreState>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SealgateResult<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|e| SealgateError::Persistence {
            reason: format!("audit store lock poisoned: {}", e),
        })
    }

    /// Snapshot of all retained entries in sequence order.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.lock()
            .map(|s| s.entries.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of all checkpoints in sequence order.
    pub fn checkpoints(&self) -> Vec<ChainCheckpoint> {
        self.lock()
            .map(|s| s.checkpoints.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Edit a stored entry in place, bypassing every chain rule.
    ///
    /// Simulates someone with direct database access rewriting history, so
    /// that detection by `ChainVerifier` can be exercised.  Returns `false`
    /// when no entry has that sequence.
    pub fn tamper_with<F>(&self, sequence: u64, edit: F) -> bool
    where
        F: FnOnce(&mut AuditLogEntry),
    {
        match self.lock() {
            Ok(mut state) => match state.entries.get_mut(&sequence) {
                Some(entry) => {
                    edit(entry);
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }
}

// ── AuditStore impl ───────────────────────────────────────────────────────────

impl AuditStore for InMemoryAuditStore {
    /// Rejects any entry whose sequence is not the immediate successor of
    /// the last entry (or of the latest checkpoint once everything before it
    /// has been pruned).
    fn insert(&self, entry: &AuditLogEntry) -> SealgateResult<()> {
        let mut state = self.lock()?;
        let expected = state.next_sequence();
        if entry.sequence != expected {
            return Err(SealgateError::Persistence {
                reason: format!(
                    "sequence conflict: expected {}, got {}",
                    expected, entry.sequence
                ),
            });
        }
        state.entries.insert(entry.sequence, entry.clone());
        Ok(())
    }

    fn find_last(&self) -> SealgateResult<Option<AuditLogEntry>> {
        let state = self.lock()?;
        Ok(state.entries.values().next_back().cloned())
    }

    fn find_range(&self, from: u64, to: u64) -> SealgateResult<Vec<AuditLogEntry>> {
        if from > to {
            return Ok(Vec::new());
        }
        let state = self.lock()?;
        Ok(state.entries.range(from..=to).map(|(_, e)| e.clone()).collect())
    }

    fn delete_older_than(&self, boundary: u64) -> SealgateResult<usize> {
        let mut state = self.lock()?;
        let retained = match boundary.checked_add(1) {
            Some(first_kept) => state.entries.split_off(&first_kept),
            None => BTreeMap::new(),
        };
        let deleted = state.entries.len();
        state.entries = retained;
        debug!(boundary, deleted, "audit entries deleted");
        Ok(deleted)
    }

    fn upsert_checkpoint(&self, checkpoint: &ChainCheckpoint) -> SealgateResult<()> {
        let mut state = self.lock()?;
        state
            .checkpoints
            .insert(checkpoint.sequence, checkpoint.clone());
        Ok(())
    }

    fn latest_checkpoint(&self) -> SealgateResult<Option<ChainCheckpoint>> {
        let state = self.lock()?;
        Ok(state.checkpoints.values().next_back().cloned())
    }
}
