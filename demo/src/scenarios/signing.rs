//! Scenario 1: Signed refund request
//!
//! A client signs `POST /api/v1/orders/123/refund`; the gateway accepts it
//! once and audits it.  The same headers sent again, a tampered body, and a
//! ten-minute-old signature are all refused with the same generic 401.  A
//! route no rule covers passes through unsigned.

use std::sync::Arc;

use serde_json::json;

use sealgate_contracts::{
    audit::AuditRecord,
    error::SealgateResult,
    request::{InboundRequest, HEADER_NONCE, HEADER_SIGNATURE},
};
use sealgate_core::{traits::Clock, SystemClock};
use sealgate_policy::SealgateConfig;
use sealgate_signing::{generate_nonce, SigningSecret};

use crate::gateway::{Gateway, Outcome};

const REFUND_PATH: &str = "/api/v1/orders/123/refund";

fn refund_record() -> AuditRecord {
    AuditRecord::new("agent-42", "refund.issued", "order", "123")
        .with_client("203.0.113.7", "support-console/2.3")
}

fn report(label: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Accepted { entry, signed } => {
            println!(
                "  {:<24} ACCEPTED (signed: {}, audit sequence {})",
                label, signed, entry.sequence
            );
        }
        Outcome::Rejected(rejection) => {
            println!(
                "  {:<24} REJECTED {} {}  [internal: {}]",
                label,
                rejection.status(),
                rejection.body(),
                rejection.reason()
            );
        }
    }
}

/// Run Scenario 1.
pub fn run_scenario(config: &SealgateConfig, secret: &SigningSecret) -> SealgateResult<()> {
    println!("=== Scenario 1: Signed Refund Request ===");
    println!();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let gateway = Gateway::build(config, secret, Arc::clone(&clock))?;

    let body = json!({
        "amount": 100.00,
        "reason": "CUSTOMER_REQUEST",
        "card_number": "4111111111111111"
    });
    let request = gateway
        .signer
        .sign_request(InboundRequest::new("POST", REFUND_PATH).with_body(body))?;

    println!("  Request:   POST {}", REFUND_PATH);
    if let Some(nonce) = request.header(HEADER_NONCE) {
        println!("  Nonce:     {}", nonce);
    }
    if let Some(signature) = request.header(HEADER_SIGNATURE) {
        println!("  Signature: {}", signature);
    }
    println!();

    // ── Fresh request, then an exact replay ───────────────────────────────────

    let first = gateway.handle(&request, refund_record())?;
    report("First submission:", &first);
    if let Outcome::Accepted { entry, .. } = &first {
        println!(
            "  {:<24} card_number = {}",
            "Audited details:",
            entry.details["request"]["card_number"]
        );
    }

    let replay = gateway.handle(&request, refund_record())?;
    report("Replay:", &replay);

    // ── Tampered body ─────────────────────────────────────────────────────────

    let mut tampered = gateway
        .signer
        .sign_request(InboundRequest::new("POST", REFUND_PATH).with_body(json!({
            "amount": 100.00,
            "reason": "CUSTOMER_REQUEST"
        })))?;
    tampered.body = Some(json!({ "amount": 10000.00, "reason": "CUSTOMER_REQUEST" }));
    report("Amount changed:", &gateway.handle(&tampered, refund_record())?);

    // ── Stale timestamp ───────────────────────────────────────────────────────

    let body = json!({ "amount": 25.5, "reason": "DAMAGED" });
    let envelope = gateway.signer.sign_at(
        "POST",
        REFUND_PATH,
        &[],
        Some(&body),
        clock.now_ms() - 10 * 60 * 1000,
        &generate_nonce(),
    )?;
    let stale = InboundRequest::new("POST", REFUND_PATH)
        .with_body(body)
        .with_envelope(&envelope);
    report("Signed 10 minutes ago:", &gateway.handle(&stale, refund_record())?);

    // ── Unprotected route ─────────────────────────────────────────────────────

    let lookup = InboundRequest::new("GET", "/api/v1/orders/123");
    let read = gateway.handle(
        &lookup,
        AuditRecord::new("agent-42", "order.viewed", "order", "123"),
    )?;
    report("Unprotected GET:", &read);

    println!();
    println!(
        "  Nonces held: {}   Audit entries: {}",
        gateway.nonces.len(),
        gateway.store.len()
    );
    println!("  RESULT: one refund accepted, three forgeries refused (expected)");
    println!();

    gateway.shutdown();
    Ok(())
}
