//! Core trait definitions for the SEALGATE runtime.
//!
//! These traits are the seams between the trusted algorithms and the
//! collaborators the host service provides:
//!
//! - `NonceStore`: replay-prevention state (in-process map or shared KV)
//! - `AuditStore`: persistence for chain entries and checkpoints
//! - `Clock`: wall-clock source, swappable in tests
//! - `Job`: a unit of periodic work the scheduler triggers
//!
//! The validator, appender, verifier, and pruner only ever talk to these
//! traits, so a single-process deployment and a multi-instance one differ
//! only in which implementations are injected.

use std::time::Duration;

use chrono::{DateTime, Utc};

use sealgate_contracts::{
    audit::{AuditLogEntry, ChainCheckpoint},
    error::SealgateResult,
};

/// Consumed-nonce tracking with expiry.
///
/// Implementations backed by a shared store must map `reserve` onto a single
/// atomic "set if not exists with TTL" operation.
pub trait NonceStore: Send + Sync {
    /// Atomically record `nonce` for `ttl`.
    ///
    /// Returns `Ok(true)` when the nonce was absent (or present but expired)
    /// and is now reserved, `Ok(false)` when an unexpired record exists.
    /// Two concurrent calls with the same nonce must never both see `true`.
    fn reserve(&self, nonce: &str, ttl: Duration) -> SealgateResult<bool>;

    /// Remove expired records.  Returns how many were removed.
    fn sweep(&self) -> usize;

    /// Stop background sweeping and release held state.
    ///
    /// Subsequent reservations fail closed.
    fn shutdown(&self);
}

/// The persistence collaborator for the audit chain.
///
/// Entries are addressed by `sequence`.  Implementations must reject an
/// `insert` whose sequence does not directly follow the current last entry;
/// this is the transactional guard that keeps two writers from linking to
/// the same predecessor.
pub trait AuditStore: Send + Sync {
    /// Persist one entry.
    fn insert(&self, entry: &AuditLogEntry) -> SealgateResult<()>;

    /// The entry with the highest sequence, if any are retained.
    fn find_last(&self) -> SealgateResult<Option<AuditLogEntry>>;

    /// Entries with `from <= sequence <= to`, ascending.
    fn find_range(&self, from: u64, to: u64) -> SealgateResult<Vec<AuditLogEntry>>;

    /// Delete every entry with `sequence <= boundary`.  Returns the count.
    fn delete_older_than(&self, boundary: u64) -> SealgateResult<usize>;

    /// Insert or replace the checkpoint at `checkpoint.sequence`.
    fn upsert_checkpoint(&self, checkpoint: &ChainCheckpoint) -> SealgateResult<()>;

    /// The checkpoint with the highest sequence, if any.
    fn latest_checkpoint(&self) -> SealgateResult<Option<ChainCheckpoint>>;
}

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// A unit of periodic work.
///
/// `run` executes synchronously to completion; the scheduler never
/// interrupts it.  Errors are logged by the scheduler and the job is retried
/// on its next natural trigger.
pub trait Job: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    fn run(&self) -> SealgateResult<()>;
}
