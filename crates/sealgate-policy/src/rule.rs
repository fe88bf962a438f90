//! Route rule types.
//!
//! A `RouteRule` says which requests must carry a valid signature and with
//! what settings.  Rules are evaluated in declaration order; the first
//! matching rule wins.  Requests no rule matches are not signature-protected.

use serde::{Deserialize, Serialize};

use sealgate_contracts::request::RouteConfig;

/// A single signing rule loaded from TOML.
///
/// Example:
/// ```toml
/// [[routes]]
/// id = "order-refund"
/// method = "POST"
/// path = "/api/v1/orders/*/refund"
/// required_headers = ["X-Idempotency-Key"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRule {
    /// Stable identifier used in logs.
    pub id: String,

    /// HTTP method, case-insensitive.  `"*"` matches any method.
    pub method: String,

    /// Path pattern.  A `*` segment matches exactly one path segment; a
    /// pattern of `"*"` alone matches every path.
    pub path: String,

    /// Overrides `signing.default_max_age_ms` for this route.
    pub max_age_ms: Option<u64>,

    /// Whether the query string is covered by the signature.
    #[serde(default = "default_include_query")]
    pub include_query: bool,

    /// Headers the route requires on top of the four signing headers.
    #[serde(default)]
    pub required_headers: Vec<String>,
}

fn default_include_query() -> bool {
    true
}

impl RouteRule {
    /// Return true if this rule covers `method` and `path`.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        let method_matches = self.method == "*" || self.method.eq_ignore_ascii_case(method);
        method_matches && path_matches(&self.path, path)
    }

    /// The validator settings this rule produces.
    pub fn route_config(&self, default_max_age_ms: u64) -> RouteConfig {
        RouteConfig {
            max_age_ms: self.max_age_ms.unwrap_or(default_max_age_ms),
            include_query: self.include_query,
            required_headers: self.required_headers.clone(),
        }
    }
}

fn path_matches(pattern: &str, path: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let pattern_segments: Vec<&str> = pattern.trim_end_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
    pattern_segments.len() == path_segments.len()
        && pattern_segments
            .iter()
            .zip(&path_segments)
            .all(|(p, s)| *p == "*" || p == s)
}
