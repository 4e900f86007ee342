// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Retries of a request that never reached the server. The wait grows by
/// `step` per failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
}

impl RetryPolicy {
    /// A single attempt.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            max_attempts: 1,
            step: Duration::ZERO,
        }
    }

    /// Wait before the attempt following failed `attempt` (1-based), or
    /// `None` once `max_attempts` are spent.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.step.saturating_mul(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            step: Duration::from_millis(120),
        }
    }
}
