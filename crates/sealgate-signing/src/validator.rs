//! The signature gate placed in front of sensitive handlers.
//!
//! Checks run in a fixed order:
//!
//!   algorithm → required headers → time window → signature → nonce
//!
//! The first four are pure.  Only the nonce reservation touches shared
//! state, and it runs last so a forged or stale request can never burn a
//! legitimate client's nonce.
//!
//! Every failure is returned as the same `Rejection`.  The specific cause is
//! logged here and kept inside the rejection for forensics, so a client
//! probing the endpoint cannot tell a stale timestamp from a bad signature
//! or a replayed nonce.

use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use sealgate_contracts::{
    error::{SealgateError, SealgateResult},
    request::{
        InboundRequest, Rejection, RouteConfig, SignatureEnvelope, HEADER_ALGORITHM,
        HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP, SUPPORTED_ALGORITHM,
    },
};
use sealgate_core::{
    traits::{Clock, NonceStore},
    SystemClock,
};

use crate::{canonical::canonical_string, secret::SigningSecret};

/// Validates signed requests against the server-held secret.
pub struct SignatureValidator {
    secret: SigningSecret,
    nonces: Arc<dyn NonceStore>,
    clock: Arc<dyn Clock>,
}

impl SignatureValidator {
    pub fn new(secret: SigningSecret, nonces: Arc<dyn NonceStore>) -> Self {
        Self::with_clock(secret, nonces, Arc::new(SystemClock))
    }

    pub fn with_clock(
        secret: SigningSecret,
        nonces: Arc<dyn NonceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { secret, nonces, clock }
    }

    /// Validate `request` under `config`.
    ///
    /// On success the accepted envelope is returned and its nonce is
    /// consumed.  On failure the generic `Rejection` is returned; its
    /// `reason()` must only reach internal logs.
    pub fn validate(
        &self,
        request: &InboundRequest,
        config: &RouteConfig,
    ) -> Result<SignatureEnvelope, Rejection> {
        match self.check(request, config) {
            Ok(envelope) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    nonce = %envelope.nonce,
                    "signed request accepted"
                );
                Ok(envelope)
            }
            Err(reason) => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    reason = %reason,
                    "signed request rejected"
                );
                Err(Rejection::new(reason))
            }
        }
    }

    fn check(
        &self,
        request: &InboundRequest,
        config: &RouteConfig,
    ) -> SealgateResult<SignatureEnvelope> {
        // A zero window would store nonces already expired, so replays
        // inside the same millisecond would pass.
        if config.max_age_ms == 0 {
            return Err(SealgateError::Configuration {
                reason: "route max_age_ms must be positive".to_string(),
            });
        }

        // ── Step 1: algorithm ───────────────────────────────────────────────
        //
        // Fails closed on anything but the one supported scheme.
        let algorithm = request.header(HEADER_ALGORITHM).unwrap_or_default();
        if algorithm != SUPPORTED_ALGORITHM {
            return Err(SealgateError::UnsupportedAlgorithm {
                algorithm: if algorithm.is_empty() {
                    "<missing>".to_string()
                } else {
                    algorithm.to_string()
                },
            });
        }

        // ── Step 2: required headers ────────────────────────────────────────
        let signature = required_header(request, HEADER_SIGNATURE)?;
        let raw_timestamp = required_header(request, HEADER_TIMESTAMP)?;
        let nonce = required_header(request, HEADER_NONCE)?;
        for name in &config.required_headers {
            required_header(request, name)?;
        }

        let timestamp: i64 =
            raw_timestamp
                .trim()
                .parse()
                .map_err(|_| SealgateError::MalformedHeader {
                    header: HEADER_TIMESTAMP.to_string(),
                    reason: "expected epoch milliseconds".to_string(),
                })?;

        // ── Step 3: time window ─────────────────────────────────────────────
        //
        // Checked before the signature so stale requests are rejected no
        // matter whether they were signed correctly.
        let now = self.clock.now_ms();
        let max_age = i64::try_from(config.max_age_ms).unwrap_or(i64::MAX);
        let skew = now.saturating_sub(timestamp).saturating_abs();
        if skew > max_age {
            return Err(SealgateError::StaleTimestamp {
                skew_ms: skew,
                max_age_ms: config.max_age_ms,
            });
        }

        // ── Step 4: signature ───────────────────────────────────────────────
        let query: &[(String, String)] = if config.include_query {
            &request.query
        } else {
            &[]
        };
        let canonical = canonical_string(
            &request.method,
            &request.path,
            query,
            request.body.as_ref(),
            timestamp,
            nonce,
        );
        let expected = self.secret.mac_hex(canonical.as_bytes())?;
        let presented = signature.trim().to_ascii_lowercase();
        if !bool::from(expected.as_bytes().ct_eq(presented.as_bytes())) {
            return Err(SealgateError::InvalidSignature);
        }

        // ── Step 5: nonce ───────────────────────────────────────────────────
        //
        // Keep the nonce until the timestamp itself leaves the window; a
        // future-dated request stays valid longer than `max_age` from now.
        let remaining = timestamp.saturating_add(max_age).saturating_sub(now);
        let ttl_ms = u64::try_from(remaining.max(max_age)).unwrap_or(config.max_age_ms);
        if !self.nonces.reserve(nonce, Duration::from_millis(ttl_ms))? {
            return Err(SealgateError::ReplayDetected {
                nonce: nonce.to_string(),
            });
        }

        Ok(SignatureEnvelope {
            signature: presented,
            timestamp,
            nonce: nonce.to_string(),
            algorithm: algorithm.to_string(),
        })
    }
}

fn required_header<'a>(request: &'a InboundRequest, name: &str) -> SealgateResult<&'a str> {
    match request.header(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SealgateError::MissingHeader {
            header: name.to_ascii_lowercase(),
        }),
    }
}
