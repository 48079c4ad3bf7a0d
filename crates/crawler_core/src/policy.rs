use std::time::Duration;

use crate::Pause;

/// What to do when a fetched payload cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFailurePolicy {
    /// Record the unit as missing and continue with the next one.
    SkipUnit,
    /// Treat the failure like a transient fetch error for the same unit.
    RetryUnit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub request_delay: Duration,
    pub retry_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub storage: StorageFailurePolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 9,
            request_delay: Duration::from_secs(1),
            retry_delay: Duration::from_secs(1),
            rate_limit_cooldown: Duration::from_secs(60),
            storage: StorageFailurePolicy::SkipUnit,
        }
    }
}

impl RetryPolicy {
    /// Failures tolerated for one unit before it is skipped; never below one.
    pub fn retry_budget(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub fn duration_of(&self, pause: Pause) -> Duration {
        match pause {
            Pause::Pacing => self.request_delay,
            Pause::Backoff => self.retry_delay,
            Pause::Cooldown => self.rate_limit_cooldown,
        }
    }
}
