//! The top-level configuration document.
//!
//! `SealgateConfig` is deserialized from TOML and validated once at load
//! time, so a bad deployment fails at startup rather than on the first
//! signed request.  The signing secret itself never appears in the file:
//! `signing.secret_env` names the environment variable holding it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use sealgate_contracts::{
    error::{SealgateError, SealgateResult},
    request::DEFAULT_MAX_AGE_MS,
    retention::RetentionPolicy,
};

use crate::rule::RouteRule;

/// Example:
/// ```toml
/// [signing]
/// secret_env = "SEALGATE_SIGNING_SECRET"
/// default_max_age_ms = 300000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningSection {
    pub secret_env: String,
    #[serde(default = "default_max_age_ms")]
    pub default_max_age_ms: u64,
}

fn default_max_age_ms() -> u64 {
    DEFAULT_MAX_AGE_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceSection {
    #[serde(default = "default_nonce_capacity")]
    pub capacity: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_nonce_capacity() -> usize {
    100_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for NonceSection {
    fn default() -> Self {
        Self {
            capacity: default_nonce_capacity(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditSection {
    /// Extra detail keys to redact on top of the built-in list.
    #[serde(default)]
    pub redact_keys: Vec<String>,
}

/// Daily job times, `"HH:MM"` UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsSection {
    #[serde(default = "default_verify_at")]
    pub verify_at: String,
    #[serde(default = "default_verify_limit")]
    pub verify_limit: usize,
    #[serde(default = "default_prune_at")]
    pub prune_at: String,
}

fn default_verify_at() -> String {
    "02:00".to_string()
}

fn default_verify_limit() -> usize {
    10_000
}

fn default_prune_at() -> String {
    "03:00".to_string()
}

impl Default for JobsSection {
    fn default() -> Self {
        Self {
            verify_at: default_verify_at(),
            verify_limit: default_verify_limit(),
            prune_at: default_prune_at(),
        }
    }
}

impl JobsSection {
    /// `(hour, minute)` of the daily verification run.
    pub fn verify_time(&self) -> SealgateResult<(u32, u32)> {
        parse_hh_mm("jobs.verify_at", &self.verify_at)
    }

    /// `(hour, minute)` of the daily pruning run.
    pub fn prune_time(&self) -> SealgateResult<(u32, u32)> {
        parse_hh_mm("jobs.prune_at", &self.prune_at)
    }
}

fn parse_hh_mm(field: &str, value: &str) -> SealgateResult<(u32, u32)> {
    let invalid = || SealgateError::Configuration {
        reason: format!("{} must be HH:MM, got '{}'", field, value),
    };
    let (h, m) = value.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// The whole SEALGATE configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealgateConfig {
    pub signing: SigningSection,
    #[serde(default)]
    pub nonce: NonceSection,
    /// Ordered list of signing rules.  First match wins.
    #[serde(default)]
    pub routes: Vec<RouteRule>,
    #[serde(default)]
    pub retention: RetentionPolicy,
    #[serde(default)]
    pub audit: AuditSection,
    #[serde(default)]
    pub jobs: JobsSection,
}

impl SealgateConfig {
    /// Parse and validate `s`.
    ///
    /// Returns `SealgateError::Configuration` if the TOML is malformed, does
    /// not match the schema, or carries out-of-range values.
    pub fn from_toml_str(s: &str) -> SealgateResult<Self> {
        let config: SealgateConfig = toml::from_str(s).map_err(|e| SealgateError::Configuration {
            reason: format!("failed to parse sealgate TOML: {}", e),
        })?;
        config.validate()?;
        info!(
            routes = config.routes.len(),
            retention_classes = config.retention.classes.len(),
            "sealgate configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it.
    pub fn from_file(path: &Path) -> SealgateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SealgateError::Configuration {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> SealgateResult<()> {
        let fail = |reason: String| Err(SealgateError::Configuration { reason });

        if self.signing.secret_env.trim().is_empty() {
            return fail("signing.secret_env must name an environment variable".to_string());
        }
        if self.signing.default_max_age_ms == 0 {
            return fail("signing.default_max_age_ms must be positive".to_string());
        }
        if self.nonce.capacity == 0 || self.nonce.sweep_interval_secs == 0 {
            return fail("nonce.capacity and nonce.sweep_interval_secs must be positive".to_string());
        }
        for route in &self.routes {
            if route.max_age_ms == Some(0) {
                return fail(format!("route '{}' has a zero max_age_ms", route.id));
            }
        }
        if self.retention.default_max_age_days == 0 {
            return fail("retention.default_max_age_days must be positive".to_string());
        }
        for class in &self.retention.classes {
            if class.max_age_days == 0 {
                return fail(format!("retention class '{}' has a zero max_age_days", class.name));
            }
        }
        if self.jobs.verify_limit == 0 {
            return fail("jobs.verify_limit must be positive".to_string());
        }
        self.jobs.verify_time()?;
        self.jobs.prune_time()?;
        Ok(())
    }
}
