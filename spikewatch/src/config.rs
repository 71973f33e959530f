use std::time::Duration;

use tracing::warn;

/// Configuration for the dashboard backend client and admin console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Base URL of the REST backend (e.g. `http://127.0.0.1:8000`).
    pub api_url: String,
    /// User that may never be deleted, in addition to `Stats`.
    pub super_admin: String,
    /// Pre-issued bearer token, attached to every request when set.
    pub api_token: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Statistics refresh interval in milliseconds.
    pub stats_refresh_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".into(),
            super_admin: "admin".into(),
            api_token: None,
            request_timeout_ms: 10_000,
            stats_refresh_ms: 30_000,
        }
    }
}

impl DashboardConfig {
    /// Build from `SPIKEWATCH_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys keep their
    /// default; unparseable numbers are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_ms = |key: &str, default: u64| match get(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "ignoring unparseable duration");
                default
            }),
        };

        let defaults = Self::default();
        Self {
            api_url: get("SPIKEWATCH_API_URL").unwrap_or(defaults.api_url),
            super_admin: get("SPIKEWATCH_SUPER_ADMIN").unwrap_or(defaults.super_admin),
            api_token: get("SPIKEWATCH_API_TOKEN"),
            request_timeout_ms: get_ms("SPIKEWATCH_REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            stats_refresh_ms: get_ms("SPIKEWATCH_STATS_REFRESH_MS", defaults.stats_refresh_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn stats_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.stats_refresh_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(DashboardConfig::from_lookup(lookup(&[])), DashboardConfig::default());
    }

    #[test]
    fn test_environment_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("SPIKEWATCH_API_URL", "https://dash.example.com/api"),
            ("SPIKEWATCH_SUPER_ADMIN", "root"),
            ("SPIKEWATCH_API_TOKEN", "secret"),
            ("SPIKEWATCH_STATS_REFRESH_MS", "5000"),
        ]));
        assert_eq!(config.api_url, "https://dash.example.com/api");
        assert_eq!(config.super_admin, "root");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert_eq!(config.stats_refresh_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_bad_numbers_and_blanks_fall_back() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("SPIKEWATCH_REQUEST_TIMEOUT_MS", "soon"),
            ("SPIKEWATCH_API_TOKEN", "  "),
        ]));
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.api_token, None);
    }
}
