//! # sealgate-signing
//!
//! HMAC-SHA256 request signing with time-boxed, nonce-based replay
//! prevention.
//!
//! ## Overview
//!
//! A client signs the canonical form of a request (method, path, sorted
//! query, canonical JSON body, timestamp, nonce) with a shared secret and
//! sends the result in four headers.  The server recomputes the signature
//! with `SignatureValidator`, checks the time window, and consumes the nonce
//! in a `NonceStore` so the same request cannot be accepted twice.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sealgate_signing::{InMemoryNonceStore, RequestSigner, SignatureValidator, SigningSecret};
//!
//! let secret = SigningSecret::from_env("SEALGATE_SIGNING_SECRET")?;
//! let signer = RequestSigner::new(secret.clone());
//! let request = signer.sign_request(InboundRequest::new("POST", "/api/v1/orders/123/refund"))?;
//!
//! let validator = SignatureValidator::new(secret, Arc::new(InMemoryNonceStore::new()));
//! validator.validate(&request, &RouteConfig::default())?;
//! ```

pub mod canonical;
pub mod nonce;
pub mod secret;
pub mod signer;
pub mod validator;

pub use canonical::canonical_string;
pub use nonce::InMemoryNonceStore;
pub use secret::SigningSecret;
pub use signer::{generate_nonce, sign, RequestSigner};
pub use validator::SignatureValidator;

// ── Tests ─────────────────────────────────────────────────────────────────────
