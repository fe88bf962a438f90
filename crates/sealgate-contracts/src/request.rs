//! Inbound request, signature envelope, and per-route validation types.
//!
//! SEALGATE does not own HTTP routing.  The hosting framework converts its
//! native request into an `InboundRequest` and hands it to the validator
//! together with the `RouteConfig` for the matched route.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SealgateError;

/// Header carrying the hex-encoded HMAC.
pub const HEADER_SIGNATURE: &str = "X-Request-Signature";
/// Header carrying the signing time in epoch milliseconds.
pub const HEADER_TIMESTAMP: &str = "X-Request-Timestamp";
/// Header carrying the single-use nonce.
pub const HEADER_NONCE: &str = "X-Request-Nonce";
/// Header naming the signature scheme.
pub const HEADER_ALGORITHM: &str = "X-Signature-Algorithm";

/// The only accepted value of `X-Signature-Algorithm`.
pub const SUPPORTED_ALGORITHM: &str = "hmac-sha256";

/// Default replay window: five minutes.
pub const DEFAULT_MAX_AGE_MS: u64 = 5 * 60 * 1000;

/// The signature material attached to a single request.
///
/// Lives for one request only.  The nonce is retained by the `NonceStore`
/// for the replay window; the envelope itself is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    /// Lowercase hex HMAC-SHA256 of the canonical string.
    pub signature: String,
    /// Signing time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Random single-use token (32 hex chars when generated by the signer).
    pub nonce: String,
    /// Always `SUPPORTED_ALGORITHM` for envelopes this crate produces.
    pub algorithm: String,
}

impl SignatureEnvelope {
    /// The four `(header, value)` pairs a client sends with the request.
    pub fn headers(&self) -> [(&'static str, String); 4] {
        [
            (HEADER_SIGNATURE, self.signature.clone()),
            (HEADER_TIMESTAMP, self.timestamp.to_string()),
            (HEADER_NONCE, self.nonce.clone()),
            (HEADER_ALGORITHM, self.algorithm.clone()),
        ]
    }
}

/// A framework-neutral view of an HTTP request.
///
/// Header names are stored lowercased so lookups are case-insensitive, as
/// HTTP requires.  Query pairs keep the order the client sent them; the
/// canonicalizer sorts them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Append one query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach all four signing headers from `envelope`.
    pub fn with_envelope(mut self, envelope: &SignatureEnvelope) -> Self {
        for (name, value) in envelope.headers() {
            self.headers.insert(name.to_ascii_lowercase(), value);
        }
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Validation settings for one protected route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Maximum allowed `|now - timestamp|`, also the nonce retention time.
    pub max_age_ms: u64,
    /// Whether the query string participates in the canonical form.
    pub include_query: bool,
    /// Extra headers the route insists on, beyond the four signing headers.
    pub required_headers: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            max_age_ms: DEFAULT_MAX_AGE_MS,
            include_query: true,
            required_headers: Vec::new(),
        }
    }
}

/// The single externally visible outcome of a failed validation.
///
/// `Display` and `body()` are identical for every failure so that callers
/// cannot distinguish a stale timestamp from a bad signature or a replayed
/// nonce.  The specific reason is reachable through `reason()` for internal
/// logging only.
#[derive(Clone, PartialEq, Eq)]
pub struct Rejection {
    reason: SealgateError,
}

impl Rejection {
    /// The generic message returned to clients.
    pub const MESSAGE: &'static str = "invalid request";

    pub fn new(reason: SealgateError) -> Self {
        Self { reason }
    }

    /// HTTP status the edge should respond with.
    pub fn status(&self) -> u16 {
        401
    }

    /// JSON body the edge should respond with.
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "error": Self::MESSAGE })
    }

    /// The forensic reason.  Never expose this to the caller.
    pub fn reason(&self) -> &SealgateError {
        &self.reason
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rejection")
            .field("reason", &self.reason)
            .finish()
    }
}

impl std::error::Error for Rejection {}
