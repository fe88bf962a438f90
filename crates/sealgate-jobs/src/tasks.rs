//! The two periodic audit jobs.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use tracing::error;

use sealgate_audit::{violation, ChainVerifier, RetentionPruner};
use sealgate_contracts::{
    audit::ChainReport,
    error::{SealgateError, SealgateResult},
    retention::RetentionPolicy,
};
use sealgate_core::traits::Job;

/// Daily chain verification.
///
/// A broken chain is raised as a critical `error!` event carrying
/// `alert = "chain_integrity_violation"` and left untouched for manual
/// investigation.  The run itself still succeeds; only a store failure
/// makes it return `Err`.
pub struct VerifyChainJob {
    verifier: ChainVerifier,
    limit: usize,
    last_report: Mutex<Option<ChainReport>>,
}

impl VerifyChainJob {
    pub fn new(verifier: ChainVerifier, limit: usize) -> Self {
        Self {
            verifier,
            limit,
            last_report: Mutex::new(None),
        }
    }

    /// The report of the most recent completed run.
    pub fn last_report(&self) -> Option<ChainReport> {
        self.last_report.lock().ok().and_then(|r| r.clone())
    }
}

impl Job for VerifyChainJob {
    fn name(&self) -> &str {
        "verify-chain"
    }

    fn run(&self) -> SealgateResult<()> {
        let report = self.verifier.verify(self.limit)?;

        if let Some(SealgateError::ChainIntegrityViolation { sequence, reason }) = violation(&report) {
            error!(
                alert = "chain_integrity_violation",
                sequence,
                affected = report.errors.len(),
                reason = %reason,
                "audit chain integrity violation; manual investigation required"
            );
        }

        let mut slot = self.last_report.lock().map_err(|e| SealgateError::Persistence {
            reason: format!("verify report lock poisoned: {}", e),
        })?;
        *slot = Some(report);
        Ok(())
    }
}

/// Daily retention pruning.
pub struct PruneJob {
    pruner: RetentionPruner,
    policy: RetentionPolicy,
    last_deleted: AtomicUsize,
}

impl PruneJob {
    pub fn new(pruner: RetentionPruner, policy: RetentionPolicy) -> Self {
        Self {
            pruner,
            policy,
            last_deleted: AtomicUsize::new(0),
        }
    }

    /// Entries deleted by the most recent successful run.
    pub fn last_deleted(&self) -> usize {
        self.last_deleted.load(Ordering::SeqCst)
    }
}

impl Job for PruneJob {
    fn name(&self) -> &str {
        "prune-audit"
    }

    fn run(&self) -> SealgateResult<()> {
        let deleted = self.pruner.prune(&self.policy)?;
        self.last_deleted.store(deleted, Ordering::SeqCst);
        Ok(())
    }
}
