use std::env;
use std::time::Duration;

use crate::parse_var;

/// Polling loop configuration.
///
/// # Environment Variables
///
/// - `POLL_INTERVAL_SECS`: Interval between successful polls (default: `30`)
/// - `POLL_BACKOFF_MULTIPLIER`: Interval stretch factor per consecutive failure (default: `2.0`)
/// - `POLL_MAX_INTERVAL_SECS`: Ceiling for a stretched interval (default: `300`)
/// - `POLL_MAX_FAILURES`: Consecutive failures tolerated before polling stops (default: `5`)
#[derive(Clone, Debug, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    pub max_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            multiplier: 2.0,
            max_interval: Duration::from_secs(300),
            max_failures: 5,
        }
    }
}

impl PollConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            interval: parse_var(&lookup, "POLL_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            multiplier: parse_var(&lookup, "POLL_BACKOFF_MULTIPLIER")
                .filter(|m: &f64| m.is_finite() && *m >= 1.0)
                .unwrap_or(defaults.multiplier),
            max_interval: parse_var(&lookup, "POLL_MAX_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_interval),
            max_failures: parse_var(&lookup, "POLL_MAX_FAILURES").unwrap_or(defaults.max_failures),
        }
    }

    /// Config with a custom base interval and default backoff settings.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::vars;

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.max_interval, Duration::from_secs(300));
        assert_eq!(config.max_failures, 5);
    }

    #[test]
    fn test_from_lookup() {
        let config = PollConfig::from_lookup(vars(&[
            ("POLL_INTERVAL_SECS", "15"),
            ("POLL_MAX_FAILURES", "2"),
            ("POLL_BACKOFF_MULTIPLIER", "garbage"),
        ]));
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.max_failures, 2);
        assert_eq!(config.multiplier, 2.0);
    }
}
