use std::time::Duration;

use chrono_tz::Tz;
use nova_core::telemetry::ROLLING_WINDOW;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const RECONCILE_DELAY_MS: u64 = 500;
const RECONCILE_DELAY_MS_MAX: u64 = 60_000;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS_MIN: u64 = 1;
const REQUEST_TIMEOUT_SECS_MAX: u64 = 600;
const HISTORY_LIMIT: u64 = 50;
/// The history endpoints accept 1..=500.
const HISTORY_LIMIT_MIN: u64 = 1;
const HISTORY_LIMIT_MAX: u64 = 500;

const API_URL_ENV: &str = "NOVA_API_URL";
const RECONCILE_DELAY_ENV: &str = "NOVA_RECONCILE_DELAY_MS";
const REQUEST_TIMEOUT_ENV: &str = "NOVA_REQUEST_TIMEOUT_SECS";
const HISTORY_LIMIT_ENV: &str = "NOVA_HISTORY_LIMIT";

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub api_url: String,
    /// Delay between a confirmed write and its reconciliation reload
    pub reconcile_delay: Duration,
    pub request_timeout: Duration,
    /// Records requested per history fetch
    pub history_limit: u64,
    /// Entries per kind the dashboard projects
    pub window: usize,
    /// Display timezone for chart labels
    pub timezone: Tz,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            reconcile_delay: Duration::from_millis(RECONCILE_DELAY_MS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            history_limit: HISTORY_LIMIT,
            window: ROLLING_WINDOW,
            timezone: Tz::UTC,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        Self::from_raw(
            std::env::var(API_URL_ENV).ok(),
            std::env::var(RECONCILE_DELAY_ENV).ok(),
            std::env::var(REQUEST_TIMEOUT_ENV).ok(),
            std::env::var(HISTORY_LIMIT_ENV).ok(),
        )
    }

    fn from_raw(
        api_url: Option<String>,
        delay_raw: Option<String>,
        timeout_raw: Option<String>,
        limit_raw: Option<String>,
    ) -> Self {
        let defaults = Self::default();
        let api_url = api_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_url);
        let delay_ms = parse_u64_with_bounds(delay_raw, 0, RECONCILE_DELAY_MS_MAX, RECONCILE_DELAY_MS);
        let timeout_secs = parse_u64_with_bounds(
            timeout_raw,
            REQUEST_TIMEOUT_SECS_MIN,
            REQUEST_TIMEOUT_SECS_MAX,
            REQUEST_TIMEOUT_SECS,
        );
        let history_limit =
            parse_u64_with_bounds(limit_raw, HISTORY_LIMIT_MIN, HISTORY_LIMIT_MAX, HISTORY_LIMIT);
        Self {
            api_url,
            reconcile_delay: Duration::from_millis(delay_ms),
            request_timeout: Duration::from_secs(timeout_secs),
            history_limit,
            ..defaults
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reconcile_delay(mut self, delay: Duration) -> Self {
        self.reconcile_delay = delay;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

fn parse_u64_with_bounds(raw: Option<String>, min: u64, max: u64, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .map(|parsed| parsed.clamp(min, max))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_use_defaults() {
        let config = SyncConfig::from_raw(None, None, None, None);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.reconcile_delay, Duration::from_millis(500));
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.window, 7);
    }

    #[test]
    fn raw_values_are_parsed_and_clamped() {
        let config = SyncConfig::from_raw(
            Some("http://backend:8000/".into()),
            Some("250".into()),
            Some("0".into()),
            Some("9000".into()),
        );
        assert_eq!(config.api_url, "http://backend:8000");
        assert_eq!(config.reconcile_delay, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(1));
        assert_eq!(config.history_limit, 500);
    }

    #[test]
    fn garbage_values_fall_back() {
        let config = SyncConfig::from_raw(Some("  ".into()), Some("soon".into()), None, Some("-3".into()));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.reconcile_delay, Duration::from_millis(500));
        assert_eq!(config.history_limit, 50);
    }
}
