//! Option store model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Option name of the settings record.
pub const SETTINGS_KEY: &str = "webpagetest-slack";
/// Option name of the pending test identifier.
pub const TEST_ID_KEY: &str = "wpt_test_id";
/// Option name of the pending action description.
pub const TEST_ACTION_KEY: &str = "wpt_test_action";
/// Option name of the time the pending identifier was written.
pub const TEST_TRIGGERED_AT_KEY: &str = "wpt_test_triggered_at";

/// The relay settings, stored as one record.
///
/// Missing fields read as empty strings, matching how the record was
/// written by older versions that only stored a subset of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webpage_apikey: String,
    pub wpttest_url: String,
    pub wpttest_tests: String,
    pub slack_url: String,
    pub slack_channel: String,
}

impl Settings {
    /// Copy with the API key masked down to its last four characters.
    pub fn masked(&self) -> Self {
        let chars: Vec<char> = self.webpage_apikey.chars().collect();
        let keep = chars.len().saturating_sub(4);
        let webpage_apikey = chars
            .iter()
            .enumerate()
            .map(|(i, c)| if i < keep { '*' } else { *c })
            .collect();

        Self {
            webpage_apikey,
            ..self.clone()
        }
    }
}

/// The test currently in flight, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PendingTest {
    /// Empty when nothing is pending.
    pub test_id: String,
    pub action: String,
    pub triggered_at: Option<DateTime<Utc>>,
}

impl PendingTest {
    pub fn is_pending(&self) -> bool {
        !self.test_id.is_empty()
    }

    /// Seconds since the identifier was written, when known.
    pub fn age_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.triggered_at.map(|t| (now - t).num_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_keeps_last_four() {
        let settings = Settings {
            webpage_apikey: "A.1234567890abcd".to_string(),
            slack_channel: "#perf".to_string(),
            ..Default::default()
        };
        let masked = settings.masked();
        assert_eq!(masked.webpage_apikey, "************abcd");
        assert_eq!(masked.slack_channel, "#perf");
    }

    #[test]
    fn test_masked_short_key() {
        let settings = Settings {
            webpage_apikey: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.masked().webpage_apikey, "abc");
    }

    #[test]
    fn test_partial_record_deserializes() {
        let settings: Settings = serde_json::from_str(r#"{"slack_url":"https://hooks.example"}"#).unwrap();
        assert_eq!(settings.slack_url, "https://hooks.example");
        assert_eq!(settings.wpttest_url, "");
    }
}
