//! The delivered event payload.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::Value;

/// One published event.
///
/// Built once per publish call and shared read-only (as `Arc<Envelope>`)
/// across however many delivery attempts are needed to find a live waiter.
///
/// Wire shape, exact keys: `account` (the private channel id — the field
/// name is a legacy synonym kept for client compatibility), `event`,
/// `time` (integer Unix seconds), `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Private channel id the event is delivered to. Reaches subscribers
    /// only; publisher-facing responses never echo it.
    #[serde(rename = "account")]
    pub channel: String,
    /// Event name chosen by the publisher.
    pub event: String,
    /// Wall-clock publish time, Unix seconds.
    pub time: i64,
    /// Free-form event data. For HTTP publishes this is a map from query
    /// parameter name to the list of its values.
    pub data: Value,
}

impl Envelope {
    /// Builds an envelope stamped with the current wall-clock time.
    #[must_use]
    pub fn new(channel: impl Into<String>, event: impl Into<String>, data: Value) -> Self {
        Self::at(channel, event, unix_now(), data)
    }

    /// Builds an envelope with an explicit timestamp.
    #[must_use]
    pub fn at(
        channel: impl Into<String>,
        event: impl Into<String>,
        time: i64,
        data: Value,
    ) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
            time,
            data,
        }
    }
}

/// Current wall-clock time as Unix seconds.
#[must_use]
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_keys() {
        let env = Envelope::at("alice-channel", "ping", 1_700_000_000, json!({"x": ["1"]}));
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({
                "account": "alice-channel",
                "event": "ping",
                "time": 1_700_000_000,
                "data": {"x": ["1"]}
            })
        );
    }

    #[test]
    fn test_envelope_new_stamps_now() {
        let before = unix_now();
        let env = Envelope::new("c", "e", Value::Null);
        let after = unix_now();
        assert!(env.time >= before && env.time <= after);
    }

    #[test]
    fn test_unix_now_sane() {
        // Well past 2020, well before the heat death of the universe.
        let now = unix_now();
        assert!(now > 1_577_836_800);
        assert!(now < 32_503_680_000);
    }
}
