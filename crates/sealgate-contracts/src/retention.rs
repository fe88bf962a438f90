//! Retention classes: how long each kind of audit entry must be kept.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Standard operational actions are kept for 90 days.
pub const STANDARD_RETENTION_DAYS: u32 = 90;

/// Financial and security-relevant actions are kept for seven years.
pub const REGULATED_RETENTION_DAYS: u32 = 2557;

/// A named retention class and the actions it covers.
///
/// Patterns match an audit `action` exactly, as a prefix when they end in
/// `*`, or anything when they are `"*"` alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionClass {
    pub name: String,
    pub max_age_days: u32,
    pub actions: Vec<String>,
}

impl RetentionClass {
    pub fn matches(&self, action: &str) -> bool {
        self.actions.iter().any(|pattern| pattern_matches(pattern, action))
    }
}

fn pattern_matches(pattern: &str, action: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => action.starts_with(prefix),
        None => pattern == action,
    }
}

/// Maps each audit action to a maximum age.
///
/// Classes are consulted in order; the first match wins.  Actions no class
/// claims fall back to `default_max_age_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub default_max_age_days: u32,
    pub classes: Vec<RetentionClass>,
}

impl RetentionPolicy {
    /// Name of the class governing `action`, or `"standard"`.
    pub fn class_for(&self, action: &str) -> &str {
        self.classes
            .iter()
            .find(|c| c.matches(action))
            .map(|c| c.name.as_str())
            .unwrap_or("standard")
    }

    /// Maximum age of an entry recording `action`.
    pub fn max_age_for(&self, action: &str) -> Duration {
        let days = self
            .classes
            .iter()
            .find(|c| c.matches(action))
            .map(|c| c.max_age_days)
            .unwrap_or(self.default_max_age_days);
        Duration::days(i64::from(days))
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        let patterns = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            default_max_age_days: STANDARD_RETENTION_DAYS,
            classes: vec![
                RetentionClass {
                    name: "financial".to_string(),
                    max_age_days: REGULATED_RETENTION_DAYS,
                    actions: patterns(&["refund*", "payment*", "payout*", "chargeback*", "invoice*"]),
                },
                RetentionClass {
                    name: "security".to_string(),
                    max_age_days: REGULATED_RETENTION_DAYS,
                    actions: patterns(&["auth.*", "login*", "permission*", "role*", "api_key*", "password*"]),
                },
            ],
        }
    }
}
