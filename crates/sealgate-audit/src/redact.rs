//! Redaction of sensitive keys in audit details.

use std::collections::HashSet;

use serde_json::Value;

/// Replacement written in place of a redacted value.
pub const REDACTED: &str = "[REDACTED]";

const EXACT_KEYS: &[&str] = &[
    "password",
    "passwd",
    "pwd",
    "token",
    "secret",
    "apikey",
    "authorization",
    "cookie",
    "privatekey",
    "cardnumber",
    "creditcard",
    "cvv",
    "cvc",
    "ssn",
    "pin",
];

const KEY_FRAGMENTS: &[&str] = &["password", "token", "secret", "apikey", "privatekey"];

/// Replaces the values of sensitive keys with `REDACTED`, recursively.
///
/// Keys are compared after lowercasing and dropping `_` and `-`, so
/// `api_key`, `apiKey` and `API-KEY` are all caught.  A key also matches when
/// it merely contains one of the fragments (`resetToken`, `db_password`).
#[derive(Debug, Clone)]
pub struct Redactor {
    exact: HashSet<String>,
}

impl Redactor {
    pub fn new() -> Self {
        Self {
            exact: EXACT_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Add deployment-specific keys on top of the built-in list.
    pub fn with_extra_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exact
            .extend(keys.into_iter().map(|k| normalize(k.as_ref())));
        self
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        let key = normalize(key);
        self.exact.contains(&key) || KEY_FRAGMENTS.iter().any(|f| key.contains(f))
    }

    /// Return a redacted copy of `value`.
    pub fn redact(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let v = if self.is_sensitive(k) {
                            Value::String(REDACTED.to_string())
                        } else {
                            self.redact(v)
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.redact(v)).collect()),
            other => other.clone(),
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}
