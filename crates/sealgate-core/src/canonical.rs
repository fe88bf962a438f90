//! Canonical JSON encoding.
//!
//! Both request signing and audit hashing feed JSON into a MAC or digest,
//! so the byte form must not depend on how the value was built or parsed.
//! The rules:
//!
//!   1. Object keys are emitted in byte order.
//!   2. No whitespace anywhere.
//!   3. Strings use `serde_json`'s escaping.
//!   4. Integers are plain decimal.
//!   5. A float with an integral value that fits in `i64` is written as an
//!      integer (`100.00` and `100` encode identically).
//!   6. Any other float uses the shortest round-trip form (`12.5`).

use serde_json::{Number, Value};

/// Encode `value` canonically.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_value(&map[key], out);
            }
            out.push('}');
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    // Display on a JSON string value never fails and applies serde_json's
    // escaping rules.
    out.push_str(&Value::String(s.to_owned()).to_string());
}

fn write_number(n: &Number, out: &mut String) {
    if n.is_i64() || n.is_u64() {
        out.push_str(&n.to_string());
        return;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e18 => {
            out.push_str(&(f as i64).to_string());
        }
        _ => out.push_str(&n.to_string()),
    }
}
