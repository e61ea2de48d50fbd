//! Backpressure policies consulted before each bitcoin.de request

use std::fmt::Debug;
use std::time::Duration;

use crate::config::{DEFAULT_THROTTLE_COOLDOWN_SECS, DEFAULT_THROTTLE_MIN_CREDITS};

pub trait ThrottlePolicy: Debug + Send + Sync {
    /// How long to wait before the next request given the remaining credits.
    /// `None` means send immediately.
    fn delay_before_request(&self, remaining_credits: i64) -> Option<Duration>;
}

/// Wait a fixed cooldown whenever credits drop below a threshold
#[derive(Debug, Clone)]
pub struct FixedCooldown {
    pub min_credits: i64,
    pub cooldown: Duration,
}

impl FixedCooldown {
    pub fn new(min_credits: i64, cooldown: Duration) -> Self {
        Self {
            min_credits,
            cooldown,
        }
    }
}

impl Default for FixedCooldown {
    fn default() -> Self {
        Self::new(
            DEFAULT_THROTTLE_MIN_CREDITS,
            Duration::from_secs(DEFAULT_THROTTLE_COOLDOWN_SECS),
        )
    }
}

impl ThrottlePolicy for FixedCooldown {
    fn delay_before_request(&self, remaining_credits: i64) -> Option<Duration> {
        (remaining_credits < self.min_credits).then_some(self.cooldown)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoThrottle;

impl ThrottlePolicy for NoThrottle {
    fn delay_before_request(&self, _remaining_credits: i64) -> Option<Duration> {
        None
    }
}
