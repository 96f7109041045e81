//! Reconnection Policy
//!
//! Multiplicative backoff for feed reconnection. The delay starts at a
//! floor, grows by a fixed multiplier on every scheduled attempt, is capped,
//! and resets to the floor only after a successful open.
//!
//! The sequence is deterministic: reconnect timing is part of the bridge's
//! observable contract and is asserted by tests.

use std::time::Duration;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt (the floor).
    pub initial_delay: Duration,
    /// Maximum delay between reconnection attempts.
    pub max_delay: Duration,
    /// Multiplier applied after each scheduled attempt.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(5000),
            max_delay: Duration::from_millis(60_000),
            multiplier: 1.5,
        }
    }
}

/// Reconnection policy producing the capped multiplicative delay sequence.
///
/// Attempts are unlimited; only a manual stop ends the lifecycle.
#[derive(Debug)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    current_delay: Duration,
    attempt_count: u32,
}

impl ReconnectPolicy {
    /// Create a new reconnection policy.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        let initial_delay = config.initial_delay;
        Self {
            config,
            current_delay: initial_delay,
            attempt_count: 0,
        }
    }

    /// Take the delay for the next attempt and grow the one after it.
    #[must_use]
    pub fn next_delay(&mut self) -> Duration {
        self.attempt_count += 1;
        let delay = self.current_delay;

        #[allow(clippy::cast_precision_loss)]
        let scaled = (self.current_delay.as_millis() as f64 * self.config.multiplier).round();
        let next_millis = if scaled.is_finite() && scaled > 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                scaled as u128
            }
        } else {
            0
        };
        let capped = next_millis.min(self.config.max_delay.as_millis());
        self.current_delay = Duration::from_millis(u64::try_from(capped).unwrap_or(u64::MAX));

        delay
    }

    /// Reset to the floor after a successful open.
    pub const fn reset(&mut self) {
        self.current_delay = self.config.initial_delay;
        self.attempt_count = 0;
    }

    /// Attempts scheduled since the last reset.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }
}
