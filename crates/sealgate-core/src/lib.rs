//! # sealgate-core
//!
//! The trust seams of the SEALGATE runtime.
//!
//! This crate provides:
//! - The capability traits (`NonceStore`, `AuditStore`, `Clock`, `Job`)
//! - The canonical JSON encoder shared by signing and audit hashing
//! - `SystemClock` and the test-friendly `ManualClock`

pub mod canonical;
pub mod clock;
pub mod traits;

pub use canonical::canonical_json;
pub use clock::{ManualClock, SystemClock};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    use crate::{canonical_json, clock::truncate_to_millis, traits::Clock, ManualClock};

    // ── Canonical JSON ────────────────────────────────────────────────────────

    #[test]
    fn canonical_json_sorts_keys_recursively() {
        let value = json!({ "b": 1, "a": { "z": true, "y": null } });
        assert_eq!(canonical_json(&value), r#"{"a":{"y":null,"z":true},"b":1}"#);
    }

    #[test]
    fn canonical_json_normalizes_integral_floats() {
        let parsed: serde_json::Value =
            serde_json::from_str(r#"{"amount":100.00,"reason":"CUSTOMER_REQUEST"}"#).unwrap();
        assert_eq!(
            canonical_json(&parsed),
            r#"{"amount":100,"reason":"CUSTOMER_REQUEST"}"#
        );
        assert_eq!(canonical_json(&json!(100)), canonical_json(&json!(100.0)));
    }

    #[test]
    fn canonical_json_keeps_fractional_floats() {
        assert_eq!(canonical_json(&json!(12.5)), "12.5");
        assert_eq!(canonical_json(&json!(-0.25)), "-0.25");
    }

    #[test]
    fn canonical_json_escapes_strings() {
        let value = json!({ "quote\"key": "line\nbreak" });
        assert_eq!(canonical_json(&value), r#"{"quote\"key":"line\nbreak"}"#);
    }

    #[test]
    fn canonical_json_preserves_array_order() {
        assert_eq!(canonical_json(&json!([3, 1, 2])), "[3,1,2]");
    }

    #[test]
    fn canonical_json_is_independent_of_whitespace() {
        let compact: serde_json::Value = serde_json::from_str(r#"{"a":1,"b":[1,2]}"#).unwrap();
        let spaced: serde_json::Value =
            serde_json::from_str("{ \"b\" : [ 1 , 2 ] ,\n \"a\" : 1 }").unwrap();
        assert_eq!(canonical_json(&compact), canonical_json(&spaced));
    }

    // ── Clocks ────────────────────────────────────────────────────────────────

    #[test]
    fn manual_clock_advances_only_when_told() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now_ms(), start.timestamp_millis() + 90_000);
    }

    #[test]
    fn truncate_drops_sub_millisecond_precision() {
        let t = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let truncated = truncate_to_millis(t);
        assert_eq!(truncated.timestamp_millis(), t.timestamp_millis());
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_000_000);
    }
}
