//! Scenario 2: Audit chain lifecycle
//!
//! Builds a small chain over three simulated months, prunes the expired
//! head under the configured retention classes, verifies the remainder from
//! the checkpoint, then edits one stored entry behind the appender's back
//! and shows the verifier flag it and everything after it.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;

use sealgate_audit::{violation, ChainVerifier, RetentionPruner};
use sealgate_contracts::{
    audit::{AuditRecord, ChainReport},
    error::SealgateResult,
};
use sealgate_core::ManualClock;
use sealgate_policy::SealgateConfig;
use sealgate_signing::SigningSecret;

use crate::gateway::Gateway;

fn print_report(label: &str, report: &ChainReport) {
    println!(
        "  {:<22} {} ({} checked, anchored at sequence {})",
        label,
        if report.valid { "VALID" } else { "BROKEN" },
        report.checked_count,
        report.anchor_sequence
    );
    for error in &report.errors {
        println!(
            "    sequence {:>2}: {:?} (expected {}..., found {}...)",
            error.sequence,
            error.kind,
            &error.expected[..error.expected.len().min(12)],
            &error.actual[..error.actual.len().min(12)]
        );
    }
}

/// Run Scenario 2.
pub fn run_scenario(config: &SealgateConfig, secret: &SigningSecret) -> SealgateResult<()> {
    println!("=== Scenario 2: Audit Chain Lifecycle ===");
    println!();

    let start = Utc
        .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let clock = Arc::new(ManualClock::new(start));
    let gateway = Gateway::build(config, secret, clock.clone())?;
    let appender = &gateway.appender;

    // ── Day 0: routine ticket traffic ─────────────────────────────────────────

    for ticket in ["T-100", "T-101", "T-102"] {
        appender.append(
            AuditRecord::new("agent-7", "ticket.updated", "ticket", ticket)
                .with_details(json!({ "status": "resolved" })),
        )?;
    }

    // ── Day 1: a refund, then more tickets ────────────────────────────────────

    clock.advance(Duration::days(1));
    appender.append(
        AuditRecord::new("agent-7", "refund.issued", "order", "123")
            .with_details(json!({ "amount": 100.0, "api_key": "sk_live_abc" })),
    )?;
    appender.append(AuditRecord::new("agent-7", "ticket.updated", "ticket", "T-103"))?;

    // ── Day 92: a login ───────────────────────────────────────────────────────

    clock.advance(Duration::days(91));
    appender.append(
        AuditRecord::new("agent-9", "login.succeeded", "user", "agent-9")
            .with_client("198.51.100.4", "Mozilla/5.0"),
    )?;

    for entry in gateway.store.entries() {
        println!(
            "  #{} {:<16} {:<10} {}  {}...",
            entry.sequence,
            entry.action,
            entry.entity_id,
            entry.timestamp.format("%Y-%m-%d"),
            &entry.current_hash[..12]
        );
    }
    println!();

    let verifier = ChainVerifier::new(gateway.store.clone());
    print_report("Initial verify:", &verifier.verify(config.jobs.verify_limit)?);

    // ── Retention ─────────────────────────────────────────────────────────────

    let pruner = RetentionPruner::with_clock(gateway.store.clone(), clock.clone());
    let deleted = pruner.prune(&config.retention)?;
    println!(
        "  {:<22} {} entries deleted; the 7-year refund holds back the rest",
        "Prune:", deleted
    );
    for checkpoint in gateway.store.checkpoints() {
        println!(
            "  {:<22} sequence {} hash {}...",
            "Checkpoint:",
            checkpoint.sequence,
            &checkpoint.hash[..12]
        );
    }
    print_report("Verify after prune:", &verifier.verify(config.jobs.verify_limit)?);

    // ── Out-of-band edit ──────────────────────────────────────────────────────

    let refund_sequence = deleted as u64 + 1;
    gateway.store.tamper_with(refund_sequence, |entry| {
        entry.details = json!({ "amount": 10000.0 });
    });
    println!();
    println!(
        "  Edited sequence {} directly in the store (amount 100 -> 10000)",
        refund_sequence
    );

    let report = verifier.verify(config.jobs.verify_limit)?;
    print_report("Verify after edit:", &report);
    if let Some(alert) = violation(&report) {
        println!("  ALERT: {}", alert);
    }
    println!("  RESULT: tampering detected, nothing rewritten (expected)");
    println!();

    gateway.shutdown();
    Ok(())
}
