//! Configuration module for the relay.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Default WebPageTest instance.
pub const DEFAULT_SERVICE_URL: &str = "http://www.webpagetest.org";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the hook endpoints (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite option store (default: "wpt-slack.db")
    pub db_path: String,
    /// Base URL of the page-speed testing service
    pub service_url: String,
    /// Site name, used as the webhook display name
    pub site_name: String,
    /// Seconds between background poll cycles; 0 disables the loop
    pub poll_interval_secs: u64,
    /// Timeout for calls to the testing service
    pub http_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "wpt-slack.db".to_string(),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            site_name: "WordPress".to_string(),
            poll_interval_secs: 60,
            http_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WPT_SLACK_HTTP_PORT`: HTTP port (default: 8080)
    /// - `WPT_SLACK_DB_PATH`: Database file path (default: "wpt-slack.db")
    /// - `WPT_SLACK_SERVICE_URL`: testing service base URL
    /// - `WPT_SLACK_SITE_NAME`: display name for chat messages
    /// - `WPT_SLACK_POLL_INTERVAL_SECS`: background poll interval (default: 60)
    /// - `WPT_SLACK_HTTP_TIMEOUT_SECS`: testing service timeout (default: 30, 0 is ignored)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("WPT_SLACK_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("WPT_SLACK_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(url) = lookup("WPT_SLACK_SERVICE_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                cfg.service_url = url.to_string();
            }
        }

        if let Some(name) = lookup("WPT_SLACK_SITE_NAME") {
            cfg.site_name = name;
        }

        if let Some(secs) = lookup("WPT_SLACK_POLL_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
            cfg.poll_interval_secs = secs;
        }

        // A zero timeout would fail every call, so it keeps the default.
        if let Some(secs) = lookup("WPT_SLACK_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
        {
            cfg.http_timeout_secs = secs;
        }

        cfg
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Background poll interval, or `None` when the loop is disabled.
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.db_path, "wpt-slack.db");
        assert_eq!(cfg.service_url, "http://www.webpagetest.org");
        assert_eq!(cfg.poll_interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_env_overrides() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("WPT_SLACK_HTTP_PORT", "9090"),
            ("WPT_SLACK_SERVICE_URL", "https://wpt.internal/"),
            ("WPT_SLACK_SITE_NAME", "My Blog"),
            ("WPT_SLACK_POLL_INTERVAL_SECS", "0"),
        ]));
        assert_eq!(cfg.http_port, 9090);
        assert_eq!(cfg.service_url, "https://wpt.internal");
        assert_eq!(cfg.site_name, "My Blog");
        assert_eq!(cfg.poll_interval(), None);
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[
            ("WPT_SLACK_HTTP_PORT", "not-a-port"),
            ("WPT_SLACK_HTTP_TIMEOUT_SECS", "-5"),
        ]));
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_timeout_keeps_default() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[("WPT_SLACK_HTTP_TIMEOUT_SECS", "0")]));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(30));

        let cfg = ServerConfig::from_lookup(lookup_from(&[("WPT_SLACK_HTTP_TIMEOUT_SECS", "5")]));
        assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
    }
}
