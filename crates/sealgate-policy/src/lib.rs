//! # sealgate-policy
//!
//! TOML-driven configuration for the SEALGATE runtime.
//!
//! ## Overview
//!
//! One file declares which routes require signed requests (and their
//! window, query coverage, and extra headers), how long each class of audit
//! entry is retained, which extra detail keys are redacted, and when the
//! daily verification and pruning jobs run.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use sealgate_policy::{RouteTable, SealgateConfig};
//!
//! let config = SealgateConfig::from_file(Path::new("sealgate.toml"))?;
//! let routes = RouteTable::from_config(&config);
//! if let Some(route) = routes.lookup("POST", "/api/v1/orders/123/refund") {
//!     validator.validate(&request, &route)?;
//! }
//! ```
//!
//! ## Rule matching
//!
//! Each rule specifies a `method` and `path` pattern.  `method = "*"`
//! matches any method; a `*` path segment matches one segment.  Rules are
//! applied in declaration order; the first match wins.

pub mod config;
pub mod routes;
pub mod rule;

pub use config::{AuditSection, JobsSection, NonceSection, SealgateConfig, SigningSection};
pub use routes::RouteTable;
pub use rule::RouteRule;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use sealgate_contracts::error::SealgateError;

    use crate::{RouteTable, SealgateConfig};

    const FULL: &str = r#"
        [signing]
        secret_env = "SEALGATE_SIGNING_SECRET"
        default_max_age_ms = 120000

        [nonce]
        capacity = 5000
        sweep_interval_secs = 30

        [[routes]]
        id = "order-refund"
        method = "POST"
        path = "/api/v1/orders/*/refund"
        required_headers = ["X-Idempotency-Key"]

        [[routes]]
        id = "bulk-admin"
        method = "*"
        path = "/api/v1/admin/bulk"
        max_age_ms = 30000
        include_query = false

        [retention]
        default_max_age_days = 30

        [[retention.classes]]
        name = "financial"
        max_age_days = 2557
        actions = ["refund*", "payment*"]

        [audit]
        redact_keys = ["iban"]

        [jobs]
        verify_at = "01:15"
        verify_limit = 500
        prune_at = "04:45"
    "#;

    // ── 1. full document ──────────────────────────────────────────────────────

    #[test]
    fn test_full_config_parses() {
        let config = SealgateConfig::from_toml_str(FULL).unwrap();

        assert_eq!(config.signing.secret_env, "SEALGATE_SIGNING_SECRET");
        assert_eq!(config.nonce.capacity, 5000);
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.retention.default_max_age_days, 30);
        assert_eq!(config.retention.class_for("refund.issued"), "financial");
        assert_eq!(config.audit.redact_keys, vec!["iban".to_string()]);
        assert_eq!(config.jobs.verify_time().unwrap(), (1, 15));
        assert_eq!(config.jobs.prune_time().unwrap(), (4, 45));
        assert_eq!(config.jobs.verify_limit, 500);
    }

    // ── 2. defaults ───────────────────────────────────────────────────────────

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = SealgateConfig::from_toml_str(
            r#"
            [signing]
            secret_env = "S"
        "#,
        )
        .unwrap();

        assert_eq!(config.signing.default_max_age_ms, 300_000);
        assert_eq!(config.nonce.capacity, 100_000);
        assert!(config.routes.is_empty());
        assert_eq!(config.retention.class_for("payment.captured"), "financial");
        assert_eq!(config.jobs.verify_time().unwrap(), (2, 0));
        assert_eq!(config.jobs.prune_time().unwrap(), (3, 0));
    }

    // ── 3. route matching ─────────────────────────────────────────────────────

    #[test]
    fn test_route_lookup_with_segment_wildcard() {
        let config = SealgateConfig::from_toml_str(FULL).unwrap();
        let routes = RouteTable::from_config(&config);

        let refund = routes.lookup("post", "/api/v1/orders/123/refund").unwrap();
        assert_eq!(refund.max_age_ms, 120_000, "global default window applies");
        assert!(refund.include_query);
        assert_eq!(refund.required_headers, vec!["X-Idempotency-Key".to_string()]);

        assert!(routes.lookup("GET", "/api/v1/orders/123/refund").is_none());
        assert!(routes.lookup("POST", "/api/v1/orders/123/refund/extra").is_none());
        assert!(routes.lookup("POST", "/api/v1/orders/refund").is_none());
    }

    #[test]
    fn test_route_override_and_method_wildcard() {
        let config = SealgateConfig::from_toml_str(FULL).unwrap();
        let routes = RouteTable::from_config(&config);

        let bulk = routes.lookup("DELETE", "/api/v1/admin/bulk").unwrap();
        assert_eq!(bulk.max_age_ms, 30_000);
        assert!(!bulk.include_query);
    }

    #[test]
    fn test_first_match_wins() {
        let config = SealgateConfig::from_toml_str(
            r#"
            [signing]
            secret_env = "S"

            [[routes]]
            id = "specific"
            method = "POST"
            path = "/api/v1/payments/*/confirm"
            max_age_ms = 1000

            [[routes]]
            id = "catch-all"
            method = "*"
            path = "*"
            max_age_ms = 9000
        "#,
        )
        .unwrap();
        let routes = RouteTable::from_config(&config);

        assert_eq!(routes.lookup("POST", "/api/v1/payments/7/confirm").unwrap().max_age_ms, 1000);
        assert_eq!(routes.lookup("GET", "/anything").unwrap().max_age_ms, 9000);
    }

    // ── 4. validation ─────────────────────────────────────────────────────────

    #[test]
    fn test_toml_parse_error() {
        match SealgateConfig::from_toml_str("this is not valid toml ][[[") {
            Err(SealgateError::Configuration { reason }) => {
                assert!(
                    reason.contains("failed to parse sealgate TOML"),
                    "expected parse error message, got: {reason}"
                );
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_signing_section_rejected() {
        assert!(matches!(
            SealgateConfig::from_toml_str("routes = []"),
            Err(SealgateError::Configuration { .. })
        ));
    }

    #[test]
    fn test_blank_secret_env_rejected() {
        let result = SealgateConfig::from_toml_str(
            r#"
            [signing]
            secret_env = "  "
        "#,
        );
        assert!(matches!(result, Err(SealgateError::Configuration { .. })));
    }

    #[test]
    fn test_bad_job_time_rejected() {
        let result = SealgateConfig::from_toml_str(
            r#"
            [signing]
            secret_env = "S"

            [jobs]
            verify_at = "25:00"
        "#,
        );
        match result {
            Err(SealgateError::Configuration { reason }) => assert!(reason.contains("jobs.verify_at")),
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_route_window_rejected() {
        let result = SealgateConfig::from_toml_str(
            r#"
            [signing]
            secret_env = "S"

            [[routes]]
            id = "broken"
            method = "POST"
            path = "/x"
            max_age_ms = 0
        "#,
        );
        assert!(matches!(result, Err(SealgateError::Configuration { reason }) if reason.contains("broken")));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let result = SealgateConfig::from_file(std::path::Path::new("/nonexistent/sealgate.toml"));
        assert!(matches!(result, Err(SealgateError::Configuration { .. })));
    }
}
