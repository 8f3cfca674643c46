//! Cache entry codec.
//!
//! A [`CacheEntry`] wraps an opaque JSON payload with the instant it was
//! produced. The stored form is human-inspectable JSON:
//!
//! ```text
//! {"capturedAt":1732400000000,"payload":{...}}
//! ```
//!
//! `capturedAt` records when the payload was produced, not when a tier
//! stored it. Replicating an entry between tiers keeps the original value,
//! so expiry is measured from the same instant everywhere.

use crate::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Milliseconds since the Unix epoch.
    pub captured_at: i64,
    pub payload: Value,
}

/// A stored entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorruptEntry {
    pub reason: String,
}

impl std::fmt::Display for CorruptEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "corrupt cache entry: {}", self.reason)
    }
}

impl std::error::Error for CorruptEntry {}

impl CacheEntry {
    pub fn new(captured_at: i64, payload: Value) -> Self {
        Self {
            captured_at,
            payload,
        }
    }

    /// Capture a serializable payload at `captured_at`.
    ///
    /// Fails only when the payload cannot be represented as JSON (for
    /// example a map with non-string keys).
    pub fn capture<T: Serialize + ?Sized>(
        payload: &T,
        captured_at: i64,
    ) -> Result<Self, ValidationError> {
        let payload =
            serde_json::to_value(payload).map_err(|e| ValidationError::NotSerializable {
                reason: e.to_string(),
            })?;
        Ok(Self::new(captured_at, payload))
    }

    pub fn encode(&self) -> Result<String, ValidationError> {
        serde_json::to_string(self).map_err(|e| ValidationError::NotSerializable {
            reason: e.to_string(),
        })
    }

    pub fn decode(raw: &str) -> Result<Self, CorruptEntry> {
        serde_json::from_str(raw).map_err(|e| CorruptEntry {
            reason: e.to_string(),
        })
    }

    /// `capturedAt` of a stored entry, or 0 when it cannot be decoded.
    ///
    /// Eviction orders by this value, so corrupt entries always go first.
    pub fn captured_at_or_zero(raw: &str) -> i64 {
        Self::decode(raw).map(|e| e.captured_at).unwrap_or(0)
    }

    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.captured_at)
    }

    /// An entry is valid while `now - capturedAt < ttl`.
    pub fn is_valid(&self, now_millis: i64, ttl: Duration) -> bool {
        i128::from(self.age_millis(now_millis)) < ttl.as_millis() as i128
    }

    pub fn decode_payload<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_encode_layout_is_camel_case() {
        let entry = CacheEntry::new(42, json!({"week": "Week 1"}));
        let raw = entry.encode().expect("encode should succeed");
        assert_eq!(raw, r#"{"capturedAt":42,"payload":{"week":"Week 1"}}"#);
    }

    #[test]
    fn test_decode_roundtrip() {
        let entry = CacheEntry::new(1_700_000_000_000, json!({"a": [1, 2, {"b": null}]}));
        let raw = entry.encode().expect("encode should succeed");
        assert_eq!(CacheEntry::decode(&raw).expect("decode should succeed"), entry);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(CacheEntry::decode("not json").is_err());
        assert!(CacheEntry::decode(r#"{"payload": 1}"#).is_err());
        assert_eq!(CacheEntry::captured_at_or_zero("{{{"), 0);
        assert_eq!(
            CacheEntry::captured_at_or_zero(r#"{"capturedAt":7,"payload":null}"#),
            7
        );
    }

    #[test]
    fn test_validity_boundary() {
        let t = 1_000_000;
        let entry = CacheEntry::new(t, Value::Null);
        let ttl_ms = HOUR.as_millis() as i64;

        assert!(entry.is_valid(t, HOUR));
        assert!(entry.is_valid(t + ttl_ms - 1, HOUR));
        assert!(!entry.is_valid(t + ttl_ms, HOUR));
        assert!(!entry.is_valid(t + ttl_ms + 1, HOUR));
    }

    #[test]
    fn test_future_capture_is_valid() {
        let entry = CacheEntry::new(5_000, Value::Null);
        assert!(entry.is_valid(1_000, HOUR));
        assert_eq!(entry.age_millis(1_000), -4_000);
    }

    #[test]
    fn test_capture_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple key");
        let err = CacheEntry::capture(&map, 0).expect_err("tuple keys are not JSON");
        assert!(matches!(err, ValidationError::NotSerializable { .. }));
    }

    #[test]
    fn test_decode_payload_typed() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Week {
            week: String,
        }
        let entry = CacheEntry::new(0, json!({"week": "Week 3"}));
        let week: Week = entry.decode_payload().expect("decode should succeed");
        assert_eq!(week.week, "Week 3");
    }
}
