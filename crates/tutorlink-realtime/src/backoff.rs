//! Exponential backoff shared by stream reconnection and polling.

use std::time::Duration;
use tutorlink_config::{PollConfig, ReconnectConfig};

/// Exponential backoff with a ceiling and an optional attempt limit.
///
/// The delay for the `n`th scheduled retry (zero-based) is
/// `base × multiplier^n`, clamped to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    multiplier: f64,
    max: Duration,
    max_attempts: Option<u32>,
    attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            base,
            multiplier,
            max,
            max_attempts: None,
            attempts: 0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn for_reconnect(config: &ReconnectConfig) -> Self {
        Self::new(config.base_interval(), config.multiplier, config.max_interval())
            .with_max_attempts(config.max_attempts)
    }

    pub fn for_polling(config: &PollConfig) -> Self {
        Self::new(config.interval, config.multiplier, config.max_interval)
            .with_max_attempts(config.max_failures)
    }

    /// Delay for a zero-based attempt index, without touching the counter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.base.as_millis() as f64 * self.multiplier.powi(exponent);
        let ceiling = self.max.as_millis() as f64;
        if !millis.is_finite() || millis >= ceiling {
            return self.max;
        }
        Duration::from_millis(millis.round() as u64)
    }

    /// Consumes one attempt and returns its delay, or `None` once the limit
    /// has been reached.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.delay_for(self.attempts);
        self.attempts += 1;
        Some(delay)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_attempts.is_some_and(|max| self.attempts >= max)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Attempts consumed since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn base(&self) -> Duration {
        self.base
    }
}
