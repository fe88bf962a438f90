//! Runtime error types for the SEALGATE request-integrity pipeline.
//!
//! All fallible operations return `SealgateResult<T>`.  The signature
//! variants carry the forensic reason that is logged internally; callers at
//! the HTTP edge must never surface them directly (see `Rejection`).

use thiserror::Error;

/// The unified error type for the SEALGATE runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SealgateError {
    /// A signing secret or other required setting is missing or invalid.
    ///
    /// Raised at startup; the runtime never signs or validates with an
    /// absent key.
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// A header required by the route is absent.
    #[error("missing required header '{header}'")]
    MissingHeader { header: String },

    /// A signing header is present but cannot be parsed.
    #[error("malformed header '{header}': {reason}")]
    MalformedHeader { header: String, reason: String },

    /// The signature algorithm header is missing or names an unsupported scheme.
    #[error("unsupported signature algorithm '{algorithm}'")]
    UnsupportedAlgorithm { algorithm: String },

    /// The request timestamp lies outside the permitted window.
    #[error("stale timestamp: skew of {skew_ms}ms exceeds {max_age_ms}ms")]
    StaleTimestamp { skew_ms: i64, max_age_ms: u64 },

    /// The presented signature does not match the recomputed one.
    #[error("invalid request signature")]
    InvalidSignature,

    /// The nonce was already consumed inside the replay window.
    #[error("replay detected for nonce '{nonce}'")]
    ReplayDetected { nonce: String },

    /// A stored audit hash differs from its recomputed value.
    ///
    /// Reported for manual investigation; never auto-healed.
    #[error("chain integrity violation at sequence {sequence}: {reason}")]
    ChainIntegrityViolation { sequence: u64, reason: String },

    /// The persistence collaborator failed to read or write.
    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    /// The nonce store refused a reservation (shut down or saturated).
    #[error("nonce store unavailable: {reason}")]
    NonceStoreUnavailable { reason: String },
}

/// Convenience alias used throughout the SEALGATE crates.
pub type SealgateResult<T> = Result<T, SealgateError>;
