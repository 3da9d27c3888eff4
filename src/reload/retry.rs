// src/reload/retry.rs

//! Exponential backoff schedule for reload requests.

use std::fmt;
use std::time::Duration;

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Maximum delay between retries (cap for exponential growth).
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (typically 2.0).
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// 5 attempts with 1s, 2s, 4s, 8s between them.
    pub const DEFAULT: Self = Self {
        max_attempts: 5,
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(30),
        backoff_multiplier: 2.0,
    };

    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            ..Self::DEFAULT
        }
    }

    /// Delay to wait after the given failed attempt (1-indexed).
    ///
    /// `initial_delay * backoff_multiplier^(attempt - 1)`, capped at
    /// `max_delay`.
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs)
    }

    /// Backoff for the given failed attempt, or `None` when it was the last.
    pub fn next_backoff(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.delay_after_attempt(attempt))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One failed reload try. Only lives long enough to be logged and, for the
/// last attempt, folded into `ReloadFailed`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadAttempt {
    pub attempt_number: u32,
    pub error: String,
    pub next_backoff: Option<Duration>,
}

impl fmt::Display for ReloadAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {}: {}", self.attempt_number, self.error)?;
        if let Some(backoff) = self.next_backoff {
            write!(f, " (retrying in {:?})", backoff)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_doubles_between_attempts() {
        let cfg = RetryConfig::DEFAULT;
        let delays: Vec<_> = (1..=cfg.max_attempts).map(|a| cfg.next_backoff(a)).collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_secs(1)),
                Some(Duration::from_secs(2)),
                Some(Duration::from_secs(4)),
                Some(Duration::from_secs(8)),
                None,
            ]
        );
    }

    #[test]
    fn delay_is_capped() {
        let cfg = RetryConfig {
            max_attempts: 20,
            ..RetryConfig::DEFAULT
        };
        assert_eq!(cfg.delay_after_attempt(10), Duration::from_secs(30));
        assert_eq!(cfg.delay_after_attempt(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn attempt_display_mentions_backoff() {
        let attempt = ReloadAttempt {
            attempt_number: 2,
            error: "status 500".into(),
            next_backoff: Some(Duration::from_secs(2)),
        };
        assert_eq!(attempt.to_string(), "attempt 2: status 500 (retrying in 2s)");
    }
}
