//! Retry policy for stale-reference recovery.

use std::time::Duration;

/// How many times a failed operation may be re-issued, and how long to wait
/// before each attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts left.
    pub attempts_remaining: u32,
    /// Delay before each retry; `None` retries immediately.
    pub backoff: Option<Duration>,
}

impl RetryPolicy {
    /// A single immediate retry.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            attempts_remaining: 1,
            backoff: None,
        }
    }

    /// No retries.
    #[must_use]
    pub const fn never() -> Self {
        Self {
            attempts_remaining: 0,
            backoff: None,
        }
    }

    /// Consume one attempt, sleeping for the backoff first.
    ///
    /// Returns `false` once no attempts remain.
    pub async fn next_attempt(&mut self) -> bool {
        if self.attempts_remaining == 0 {
            return false;
        }
        self.attempts_remaining -= 1;
        if let Some(delay) = self.backoff {
            tokio::time::sleep(delay).await;
        }
        true
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once()
    }
}
