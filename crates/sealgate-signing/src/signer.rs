//! Request signing.
//!
//! Used by clients and by trusted internal callers.  The route's
//! `include_query` setting is the caller's concern: pass an empty query when
//! signing for a route that excludes it.

use std::sync::Arc;

use rand::RngCore;
use tracing::debug;

use sealgate_contracts::{
    error::SealgateResult,
    request::{InboundRequest, SignatureEnvelope, SUPPORTED_ALGORITHM},
};
use sealgate_core::{traits::Clock, SystemClock};

use crate::{canonical::canonical_string, secret::SigningSecret};

/// Nonce length in bytes before hex encoding.
pub const NONCE_BYTES: usize = 16;

/// A fresh 128-bit nonce from the OS RNG, lowercase hex.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Signs requests with a shared secret.
#[derive(Clone)]
pub struct RequestSigner {
    secret: SigningSecret,
    clock: Arc<dyn Clock>,
}

impl RequestSigner {
    pub fn new(secret: SigningSecret) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: SigningSecret, clock: Arc<dyn Clock>) -> Self {
        Self { secret, clock }
    }

    /// Sign with the current time and a fresh nonce.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> SealgateResult<SignatureEnvelope> {
        let nonce = generate_nonce();
        self.sign_at(method, path, query, body, self.clock.now_ms(), &nonce)
    }

    /// Sign with a caller-chosen timestamp and nonce.
    ///
    /// Deterministic: identical inputs always yield the same signature.
    pub fn sign_at(
        &self,
        method: &str,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
        timestamp: i64,
        nonce: &str,
    ) -> SealgateResult<SignatureEnvelope> {
        let canonical = canonical_string(method, path, query, body, timestamp, nonce);
        let signature = self.secret.mac_hex(canonical.as_bytes())?;

        debug!(
            method = %method.to_ascii_uppercase(),
            path = %path,
            timestamp,
            "request signed"
        );

        Ok(SignatureEnvelope {
            signature,
            timestamp,
            nonce: nonce.to_string(),
            algorithm: SUPPORTED_ALGORITHM.to_string(),
        })
    }

    /// Sign `request` as-is (query included) and attach the headers.
    pub fn sign_request(&self, request: InboundRequest) -> SealgateResult<InboundRequest> {
        let envelope = self.sign(
            &request.method,
            &request.path,
            &request.query,
            request.body.as_ref(),
        )?;
        Ok(request.with_envelope(&envelope))
    }
}

/// One-shot signing with raw key material.
///
/// Fails with `SealgateError::Configuration` when `secret` is empty.
pub fn sign(
    method: &str,
    path: &str,
    query: &[(String, String)],
    body: Option<&serde_json::Value>,
    secret: &[u8],
) -> SealgateResult<SignatureEnvelope> {
    RequestSigner::new(SigningSecret::new(secret)?).sign(method, path, query, body)
}
