//! Shared signing secret.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use sealgate_contracts::error::{SealgateError, SealgateResult};

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// An HMAC key that is guaranteed non-empty.
///
/// There is no way to build a `SigningSecret` from empty material, so
/// neither the signer nor the validator can ever run with an absent key.
#[derive(Clone)]
pub struct SigningSecret {
    key: Vec<u8>,
}

impl SigningSecret {
    /// Wrap raw key material.
    ///
    /// Returns `SealgateError::Configuration` if `key` is empty.
    pub fn new(key: impl AsRef<[u8]>) -> SealgateResult<Self> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(SealgateError::Configuration {
                reason: "signing secret is empty".to_string(),
            });
        }
        Ok(Self { key: key.to_vec() })
    }

    /// Read the secret from environment variable `var`.
    ///
    /// A missing, non-UTF-8, or blank variable is a configuration error.
    pub fn from_env(var: &str) -> SealgateResult<Self> {
        let value = std::env::var(var).map_err(|e| SealgateError::Configuration {
            reason: format!("signing secret variable '{}' unavailable: {}", var, e),
        })?;
        if value.trim().is_empty() {
            return Err(SealgateError::Configuration {
                reason: format!("signing secret variable '{}' is blank", var),
            });
        }
        Self::new(value.as_bytes())
    }

    /// HMAC-SHA256 of `message`, lowercase hex.
    pub(crate) fn mac_hex(&self, message: &[u8]) -> SealgateResult<String> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|e| SealgateError::Configuration {
                reason: format!("signing secret rejected by HMAC: {}", e),
            })?;
        mac.update(message);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
