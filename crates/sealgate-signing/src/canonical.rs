//! Canonical request strings.
//!
//! Layout (fields joined by `\n`):
//!
//!   1. method, uppercased
//!   2. path, verbatim
//!   3. query pairs stable-sorted by key, each key and value percent-encoded
//!      (RFC 3986 unreserved characters kept), `k=v` joined with `&`; empty
//!      when there is no query or the route excludes it
//!   4. body as canonical JSON; empty when there is no body
//!   5. timestamp, decimal epoch milliseconds
//!   6. nonce
//!
//! Query pairs are the decoded values the handler sees.  Encoding them here
//! keeps a literal `&` or `=` inside a value from reading as a separator.
//! Signer and validator both call `canonical_string`, which is the only
//! place this layout is defined.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use sealgate_core::canonical_json;

/// Everything except RFC 3986 unreserved: ALPHA / DIGIT / "-" / "." / "_" / "~"
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ENCODE_SET).to_string()
}

/// Join query pairs in key order.  Pairs sharing a key keep their
/// original relative order.
pub fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = query.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical body, or an empty string for body-less requests.
pub fn canonical_body(body: Option<&serde_json::Value>) -> String {
    body.map(canonical_json).unwrap_or_default()
}

/// Build the exact byte string the HMAC is computed over.
pub fn canonical_string(
    method: &str,
    path: &str,
    query: &[(String, String)],
    body: Option<&serde_json::Value>,
    timestamp: i64,
    nonce: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_ascii_uppercase(),
        path,
        canonical_query(query),
        canonical_body(body),
        timestamp,
        nonce
    )
}
