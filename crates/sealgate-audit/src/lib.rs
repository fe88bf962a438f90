//! # sealgate-audit
//!
//! Append-only, SHA-256 hash-chained audit log for SEALGATE.
//!
//! ## Overview
//!
//! Every committed `AuditLogEntry` links to its predecessor through
//! `previous_hash`, and its `current_hash` commits to that link plus every
//! recorded field.  Editing any stored entry, even by a single byte, breaks
//! its hash and every hash after it; `ChainVerifier` finds the break.
//! `RetentionPruner` trims the expired head of the chain and leaves a
//! `ChainCheckpoint` behind so verification stays anchored.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sealgate_audit::{AuditAppender, ChainVerifier, InMemoryAuditStore};
//! use sealgate_contracts::audit::AuditRecord;
//!
//! let store = Arc::new(InMemoryAuditStore::new());
//! let appender = AuditAppender::new(store.clone());
//! appender.append(AuditRecord::new("user-7", "refund.issued", "order", "123"))?;
//!
//! let report = ChainVerifier::new(store).verify(10_000)?;
//! assert!(report.valid);
//! ```

pub mod appender;
pub mod chain;
pub mod memory;
pub mod pruner;
pub mod redact;
pub mod verifier;

pub use appender::AuditAppender;
pub use chain::{hash_entry, verify_entries};
pub use memory::InMemoryAuditStore;
pub use pruner::RetentionPruner;
pub use redact::{Redactor, REDACTED};
pub use verifier::{violation, ChainVerifier};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use sealgate_contracts::{
        audit::{AuditLogEntry, AuditRecord, ChainCheckpoint, ChainErrorKind, GENESIS_HASH},
        error::{SealgateError, SealgateResult},
        retention::RetentionPolicy,
    };
    use sealgate_core::{traits::AuditStore, ManualClock};

    use super::{
        hash_entry, violation, AuditAppender, ChainVerifier, InMemoryAuditStore, Redactor,
        RetentionPruner, REDACTED,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<InMemoryAuditStore>,
        appender: AuditAppender,
        verifier: ChainVerifier,
        pruner: RetentionPruner,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryAuditStore::new());
        Fixture {
            appender: AuditAppender::with_clock(store.clone(), clock.clone()),
            verifier: ChainVerifier::new(store.clone()),
            pruner: RetentionPruner::with_clock(store.clone(), clock.clone()),
            clock,
            store,
        }
    }

    /// A distinguishable record for `action`.
    fn record(action: &str, n: u64) -> AuditRecord {
        AuditRecord::new("admin-1", action, "order", n.to_string())
            .with_details(json!({ "n": n, "note": format!("entry {n}") }))
            .with_client("10.0.0.1", "curl/8.0")
    }

    fn append_n(fx: &Fixture, action: &str, n: u64) {
        for i in 0..n {
            fx.appender.append(record(action, i)).unwrap();
        }
    }

    /// A store whose every call fails.
    struct BrokenStore;

    impl AuditStore for BrokenStore {
        fn insert(&self, _entry: &AuditLogEntry) -> SealgateResult<()> {
            Err(broken())
        }
        fn find_last(&self) -> SealgateResult<Option<AuditLogEntry>> {
            Err(broken())
        }
        fn find_range(&self, _from: u64, _to: u64) -> SealgateResult<Vec<AuditLogEntry>> {
            Err(broken())
        }
        fn delete_older_than(&self, _boundary: u64) -> SealgateResult<usize> {
            Err(broken())
        }
        fn upsert_checkpoint(&self, _checkpoint: &ChainCheckpoint) -> SealgateResult<()> {
            Err(broken())
        }
        fn latest_checkpoint(&self) -> SealgateResult<Option<ChainCheckpoint>> {
            Err(broken())
        }
    }

    fn broken() -> SealgateError {
        SealgateError::Persistence { reason: "connection refused".to_string() }
    }

    // ── Appending ─────────────────────────────────────────────────────────────

    #[test]
    fn first_entry_links_to_genesis() {
        let fx = fixture();
        let entry = fx.appender.append(record("ticket.updated", 0)).unwrap();

        assert_eq!(entry.sequence, 1);
        assert_eq!(entry.previous_hash, GENESIS_HASH);
        assert_eq!(entry.current_hash, hash_entry(&entry, GENESIS_HASH));
        assert_eq!(entry.current_hash.len(), 64);
    }

    #[test]
    fn sequences_increase_by_one_and_link() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 5);

        let entries = fx.store.entries();
        assert_eq!(entries.len(), 5);
        for (idx, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64 + 1, "sequence at position {idx}");
            if idx > 0 {
                assert_eq!(
                    entry.previous_hash, entries[idx - 1].current_hash,
                    "entry {} must link to its predecessor",
                    entry.sequence
                );
            }
        }
    }

    #[test]
    fn timestamps_are_stored_at_millisecond_precision() {
        let fx = fixture();
        fx.clock.advance(Duration::microseconds(1_500));
        let entry = fx.appender.append(record("ticket.updated", 0)).unwrap();
        assert_eq!(entry.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn sensitive_details_are_redacted_before_hashing() {
        let fx = fixture();
        let entry = fx
            .appender
            .append(
                AuditRecord::new("user-1", "password.reset", "user", "1").with_details(json!({
                    "password": "hunter2",
                    "apiKey": "k-123",
                    "nested": { "reset_token": "t-1", "email": "a@example.com" },
                    "items": [{ "client_secret": "s" }],
                })),
            )
            .unwrap();

        assert_eq!(entry.details["password"], REDACTED);
        assert_eq!(entry.details["apiKey"], REDACTED);
        assert_eq!(entry.details["nested"]["reset_token"], REDACTED);
        assert_eq!(entry.details["nested"]["email"], "a@example.com");
        assert_eq!(entry.details["items"][0]["client_secret"], REDACTED);

        let stored = fx.store.entries().remove(0);
        assert_eq!(stored, entry);
        assert!(fx.verifier.verify(10).unwrap().valid);
    }

    #[test]
    fn redactor_matches_key_variants() {
        let redactor = Redactor::default().with_extra_keys(["iban"]);
        for key in ["password", "PASSWORD", "api_key", "API-KEY", "accessToken", "db_password", "IBAN"] {
            assert!(redactor.is_sensitive(key), "{key} should be sensitive");
        }
        for key in ["amount", "reason", "email", "spinner"] {
            assert!(!redactor.is_sensitive(key), "{key} should not be sensitive");
        }
    }

    #[test]
    fn failed_insert_leaves_chain_untouched() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 2);

        let appender = AuditAppender::new(Arc::new(BrokenStore));
        assert!(matches!(
            appender.append(record("ticket.updated", 9)),
            Err(SealgateError::Persistence { .. })
        ));
        assert_eq!(fx.store.len(), 2);
    }

    #[test]
    fn store_rejects_out_of_order_sequence() {
        let fx = fixture();
        let mut entry = fx.appender.append(record("ticket.updated", 0)).unwrap();
        entry.sequence = 1;
        assert!(matches!(
            fx.store.insert(&entry),
            Err(SealgateError::Persistence { reason }) if reason.contains("sequence conflict")
        ));
    }

    /// Concurrent writers still produce one gap-free, valid chain.
    #[test]
    fn concurrent_appends_are_serialized() {
        let fx = fixture();
        let appender = &fx.appender;

        std::thread::scope(|scope| {
            for t in 0..8u64 {
                scope.spawn(move || {
                    for i in 0..25u64 {
                        appender.append(record("ticket.updated", t * 100 + i)).unwrap();
                    }
                });
            }
        });

        let entries = fx.store.entries();
        assert_eq!(entries.len(), 200);
        assert_eq!(entries.last().unwrap().sequence, 200);

        let report = fx.verifier.verify(1_000).unwrap();
        assert!(report.valid, "errors: {:?}", report.errors);
        assert_eq!(report.checked_count, 200);
    }

    // ── Verification ──────────────────────────────────────────────────────────

    #[test]
    fn verify_empty_chain_is_valid() {
        let fx = fixture();
        let report = fx.verifier.verify(100).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked_count, 0);
        assert_eq!(report.anchor_sequence, 0);
    }

    #[test]
    fn verify_full_range_is_valid() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 10);

        let report = fx.verifier.verify(100).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked_count, 10);
        assert!(violation(&report).is_none());
    }

    /// Editing entry k off-band flags k and everything after it.
    #[test]
    fn tampered_details_reported_from_k_onward() {
        let fx = fixture();
        append_n(&fx, "refund.issued", 8);

        assert!(fx.store.tamper_with(4, |e| {
            e.details = json!({ "n": 4, "note": "amount changed" });
        }));

        let report = fx.verifier.verify(100).unwrap();
        assert!(!report.valid);
        assert_eq!(report.first_error(), Some(4));
        assert_eq!(report.errors[0].kind, ChainErrorKind::HashMismatch);

        let flagged: Vec<u64> = report.errors.iter().map(|e| e.sequence).collect();
        assert_eq!(flagged, vec![4, 5, 6, 7, 8]);
        assert!(report.errors[1..]
            .iter()
            .all(|e| e.kind == ChainErrorKind::Downstream));

        match violation(&report) {
            Some(SealgateError::ChainIntegrityViolation { sequence, .. }) => assert_eq!(sequence, 4),
            other => panic!("expected ChainIntegrityViolation, got {:?}", other),
        }
    }

    /// Rewriting an entry and recomputing its hash still breaks the next link.
    #[test]
    fn rehashed_tamper_detected_at_successor() {
        let fx = fixture();
        append_n(&fx, "refund.issued", 4);

        fx.store.tamper_with(2, |e| {
            e.actor_id = "someone-else".to_string();
            e.current_hash = hash_entry(e, &e.previous_hash);
        });

        let report = fx.verifier.verify(100).unwrap();
        assert_eq!(report.first_error(), Some(3));
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn broken_link_reported_as_link_mismatch() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 3);
        fx.store.tamper_with(2, |e| e.previous_hash = "f".repeat(64));

        let report = fx.verifier.verify(100).unwrap();
        assert_eq!(report.errors[0].kind, ChainErrorKind::LinkMismatch);
        assert_eq!(report.errors[0].sequence, 2);
    }

    #[test]
    fn verify_limit_checks_most_recent_window() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 10);

        let report = fx.verifier.verify(3).unwrap();
        assert!(report.valid);
        assert_eq!(report.checked_count, 3);
        assert_eq!(report.anchor_sequence, 7);

        // Tampering inside the window is caught; outside it is left to a
        // full-range run.
        fx.store.tamper_with(9, |e| e.entity_id = "x".to_string());
        assert_eq!(fx.verifier.verify(3).unwrap().first_error(), Some(9));
        assert_eq!(fx.verifier.verify(1).unwrap().checked_count, 1);
        assert!(fx.verifier.verify(1).unwrap().valid);
    }

    #[test]
    fn verify_surfaces_persistence_failure() {
        let verifier = ChainVerifier::new(Arc::new(BrokenStore));
        assert!(matches!(verifier.verify(10), Err(SealgateError::Persistence { .. })));
    }

    // ── Pruning ───────────────────────────────────────────────────────────────

    /// Prune M old entries; the checkpoint keeps the rest verifiable.
    #[test]
    fn prune_writes_checkpoint_and_chain_stays_valid() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 6);
        fx.clock.advance(Duration::days(100));
        append_n(&fx, "ticket.updated", 4);

        let deleted = fx.pruner.prune(&RetentionPolicy::default()).unwrap();
        assert_eq!(deleted, 6);
        assert_eq!(fx.store.len(), 4);

        let checkpoints = fx.store.checkpoints();
        assert_eq!(checkpoints.len(), 1);
        assert_eq!(checkpoints[0].sequence, 6);

        let report = fx.verifier.verify(1_000).unwrap();
        assert!(report.valid, "errors: {:?}", report.errors);
        assert_eq!(report.anchor_sequence, 6);
        assert_eq!(report.checked_count, 4);
    }

    /// Runs a prune against the inner store the first time the chain tail
    /// is read, landing it between the verifier's checkpoint read and its
    /// range read.
    struct PruneDuringRead {
        inner: Arc<InMemoryAuditStore>,
        pending: std::sync::Mutex<Option<RetentionPruner>>,
    }

    impl AuditStore for PruneDuringRead {
        fn insert(&self, entry: &AuditLogEntry) -> SealgateResult<()> {
            self.inner.insert(entry)
        }
        fn find_last(&self) -> SealgateResult<Option<AuditLogEntry>> {
            let pruner = self.pending.lock().unwrap().take();
            if let Some(pruner) = pruner {
                pruner.prune(&RetentionPolicy::default())?;
            }
            self.inner.find_last()
        }
        fn find_range(&self, from: u64, to: u64) -> SealgateResult<Vec<AuditLogEntry>> {
            self.inner.find_range(from, to)
        }
        fn delete_older_than(&self, boundary: u64) -> SealgateResult<usize> {
            self.inner.delete_older_than(boundary)
        }
        fn upsert_checkpoint(&self, checkpoint: &ChainCheckpoint) -> SealgateResult<()> {
            self.inner.upsert_checkpoint(checkpoint)
        }
        fn latest_checkpoint(&self) -> SealgateResult<Option<ChainCheckpoint>> {
            self.inner.latest_checkpoint()
        }
    }

    #[test]
    fn prune_committed_mid_verify_is_not_reported_as_tampering() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 6);
        fx.clock.advance(Duration::days(100));
        append_n(&fx, "ticket.updated", 4);

        let racing = Arc::new(PruneDuringRead {
            inner: fx.store.clone(),
            pending: std::sync::Mutex::new(Some(RetentionPruner::with_clock(
                fx.store.clone(),
                fx.clock.clone(),
            ))),
        });

        let report = ChainVerifier::new(racing).verify(1_000).unwrap();
        assert!(report.valid, "errors: {:?}", report.errors);
        assert_eq!(report.anchor_sequence, 6, "walk re-anchored on the new checkpoint");
        assert_eq!(report.checked_count, 4);
        assert_eq!(fx.store.len(), 4, "the prune really ran mid-verify");
    }

    #[test]
    fn prune_stops_at_first_retained_entry() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 2);
        fx.appender.append(record("refund.issued", 99)).unwrap();
        append_n(&fx, "ticket.updated", 2);
        fx.clock.advance(Duration::days(365));

        let deleted = fx.pruner.prune(&RetentionPolicy::default()).unwrap();
        assert_eq!(deleted, 2, "the financial entry shields everything after it");
        assert_eq!(fx.store.entries()[0].action, "refund.issued");
        assert!(fx.verifier.verify(100).unwrap().valid);
    }

    #[test]
    fn prune_nothing_expired_writes_no_checkpoint() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 3);
        fx.clock.advance(Duration::days(90));

        assert_eq!(fx.pruner.prune(&RetentionPolicy::default()).unwrap(), 0);
        assert!(fx.store.checkpoints().is_empty());
    }

    #[test]
    fn prune_in_small_batches_matches_single_pass() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 23);
        fx.clock.advance(Duration::days(91));

        let pruner = RetentionPruner::with_clock(fx.store.clone(), fx.clock.clone()).with_batch_size(5);
        assert_eq!(pruner.prune(&RetentionPolicy::default()).unwrap(), 23);
    }

    /// Pruning the whole chain; the next append links to the checkpoint.
    #[test]
    fn append_after_full_prune_continues_from_checkpoint() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 3);
        let last_hash = fx.store.entries()[2].current_hash.clone();
        fx.clock.advance(Duration::days(120));

        assert_eq!(fx.pruner.prune(&RetentionPolicy::default()).unwrap(), 3);
        assert!(fx.store.is_empty());

        let entry = fx.appender.append(record("ticket.updated", 3)).unwrap();
        assert_eq!(entry.sequence, 4);
        assert_eq!(entry.previous_hash, last_hash);
        assert!(fx.verifier.verify(100).unwrap().valid);
    }

    #[test]
    fn repeated_prunes_advance_checkpoint() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 3);
        fx.clock.advance(Duration::days(50));
        append_n(&fx, "ticket.updated", 3);
        fx.clock.advance(Duration::days(50));

        assert_eq!(fx.pruner.prune(&RetentionPolicy::default()).unwrap(), 3);
        fx.clock.advance(Duration::days(50));
        assert_eq!(fx.pruner.prune(&RetentionPolicy::default()).unwrap(), 3);

        let checkpoints = fx.store.checkpoints();
        assert_eq!(checkpoints.iter().map(|c| c.sequence).collect::<Vec<_>>(), vec![3, 6]);
        assert!(fx.verifier.verify(100).unwrap().valid);
    }

    #[test]
    fn tamper_after_prune_still_detected() {
        let fx = fixture();
        append_n(&fx, "ticket.updated", 4);
        fx.clock.advance(Duration::days(100));
        append_n(&fx, "ticket.updated", 4);
        fx.pruner.prune(&RetentionPolicy::default()).unwrap();

        fx.store.tamper_with(6, |e| e.action = "ticket.deleted".to_string());
        let report = fx.verifier.verify(100).unwrap();
        assert_eq!(report.first_error(), Some(6));
        assert_eq!(report.errors.len(), 3);
    }

    #[test]
    fn prune_surfaces_persistence_failure() {
        let pruner = RetentionPruner::new(Arc::new(BrokenStore));
        assert!(pruner.prune(&RetentionPolicy::default()).is_err());
    }
}
