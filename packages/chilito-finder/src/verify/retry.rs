//! Retry, backoff and politeness timing for menu page fetches.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff with uniform jitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Fetch attempts per URL (including the first)
    pub max_attempts: u32,

    /// Base backoff in milliseconds, doubled per attempt
    pub base_delay_ms: u64,

    /// Upper bound of the uniform jitter added to each backoff
    pub max_jitter_ms: u64,

    /// Pause between successive menu URLs
    pub politeness_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_jitter_ms: 1000,
            politeness_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no waiting. For tests.
    pub fn immediate() -> Self {
        Self {
            base_delay_ms: 0,
            max_jitter_ms: 0,
            politeness_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sleep before retrying after failed attempt number `attempt` (0-based):
    /// `base_delay * 2^attempt + jitter`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        let base = self.base_delay_ms.saturating_mul(factor);
        let jitter = if self.max_jitter_ms == 0 {
            0
        } else {
            fastrand::u64(0..=self.max_jitter_ms)
        };
        Duration::from_millis(base.saturating_add(jitter))
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

/// Sleep unless the delay is zero.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
