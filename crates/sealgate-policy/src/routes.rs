//! Route lookup: which `RouteConfig`, if any, applies to a request.
//!
//! Lookup algorithm:
//!
//! 1. Iterate rules in declaration order.
//! 2. The first rule whose method and path patterns match produces the
//!    route's `RouteConfig`, with the global default window filled in.
//! 3. No match → `None`; the request is not signature-protected.

use tracing::debug;

use sealgate_contracts::request::RouteConfig;

use crate::{config::SealgateConfig, rule::RouteRule};

/// First-match route table built from `SealgateConfig::routes`.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    default_max_age_ms: u64,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>, default_max_age_ms: u64) -> Self {
        Self { rules, default_max_age_ms }
    }

    pub fn from_config(config: &SealgateConfig) -> Self {
        Self::new(config.routes.clone(), config.signing.default_max_age_ms)
    }

    /// The validator settings for `method` + `path`, if the route is protected.
    pub fn lookup(&self, method: &str, path: &str) -> Option<RouteConfig> {
        let rule = self.rules.iter().find(|r| r.matches(method, path));
        match rule {
            Some(rule) => {
                debug!(rule_id = %rule.id, method = %method, path = %path, "route rule matched");
                Some(rule.route_config(self.default_max_age_ms))
            }
            None => {
                debug!(method = %method, path = %path, "no route rule matched; unsigned route");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
