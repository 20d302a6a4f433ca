//! Retry strategies for transient failures.
//!
//! [`RetryStrategy`] computes exponential backoff with random jitter and
//! drives an async operation through [`RetryStrategy::execute`], recording
//! every wait so callers can report them.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

// ============================================================================
// Retry Decision
// ============================================================================

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again, waiting at least `floor` if given.
    Retry {
        /// Minimum wait requested by the server.
        floor: Option<Duration>,
    },
    /// Give up immediately.
    Stop,
}

impl RetryDecision {
    /// Retry with the computed backoff.
    pub const RETRY: Self = Self::Retry { floor: None };
}

// ============================================================================
// Retry Outcome
// ============================================================================

/// The result of [`RetryStrategy::execute`].
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// The final result.
    pub result: Result<T, E>,
    /// Number of attempts made (at least one).
    pub attempts: u32,
    /// Waits taken between attempts, in order.
    pub delays: Vec<Duration>,
}

// ============================================================================
// Retry Strategy
// ============================================================================

/// Strategy for retrying failed operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on the random jitter added to each delay.
    pub jitter: Duration,
    /// Whether to double the delay on every retry.
    pub exponential_backoff: bool,
    /// Maximum wait between attempts, jitter and server floor included.
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Creates a new retry strategy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_secs(1),
            jitter: Duration::from_millis(500),
            exponential_backoff: true,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            exponential_backoff: false,
            max_delay: Duration::ZERO,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the jitter bound.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets the delay cap.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Enables or disables exponential backoff.
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Calculates the delay before retry number `attempt` (1-based), without jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
            self.base_delay.saturating_mul(factor)
        } else {
            self.base_delay
        };

        delay.min(self.max_delay)
    }

    /// Calculates the delay for a retry with random jitter added.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter.is_zero() {
            return base;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis());
        let extra = Duration::from_millis(u64::try_from(extra).unwrap_or(u64::MAX));
        base.saturating_add(extra).min(self.max_delay)
    }

    /// Runs `op` until it succeeds, `decide` says stop, or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. Waits never decrease from one
    /// retry to the next and never exceed `max_delay`, even when the server
    /// asks for longer.
    pub async fn execute<T, E, F, Fut, D>(&self, mut op: F, mut decide: D) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: FnMut(&E) -> RetryDecision,
    {
        let mut delays: Vec<Duration> = Vec::new();
        let mut attempt = 1;

        loop {
            let result = op(attempt).await;
            let error = match result {
                Ok(value) => {
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                        delays,
                    };
                }
                Err(error) => error,
            };

            let floor = match decide(&error) {
                RetryDecision::Retry { floor } if attempt < self.max_attempts => floor,
                _ => {
                    return RetryOutcome {
                        result: Err(error),
                        attempts: attempt,
                        delays,
                    };
                }
            };

            let mut delay = self.jittered_delay(attempt);
            if let Some(floor) = floor {
                delay = delay.max(floor);
            }
            if let Some(previous) = delays.last() {
                delay = delay.max(*previous);
            }
            delay = delay.min(self.max_delay);

            debug!(attempt, delay_ms = delay.as_millis(), "Retrying after failure");
            tokio::time::sleep(delay).await;
            delays.push(delay);
            attempt += 1;
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff() {
        let strategy = RetryStrategy::default();

        assert_eq!(strategy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(strategy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(strategy.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(strategy.delay_for_attempt(4), Duration::from_secs(8));
    }

    #[test]
    fn test_max_delay_cap() {
        let strategy = RetryStrategy::new(10).with_base_delay(Duration::from_secs(10));

        assert_eq!(strategy.delay_for_attempt(5), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_bounds() {
        let strategy = RetryStrategy::new(3)
            .with_base_delay(Duration::from_millis(100))
            .with_jitter(Duration::from_millis(50));

        for _ in 0..20 {
            let delay = strategy.jittered_delay(2);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(250));
        }
    }

    #[tokio::test]
    async fn test_execute_succeeds_on_third_attempt() {
        let strategy = RetryStrategy::new(3)
            .with_base_delay(Duration::from_millis(5))
            .with_jitter(Duration::ZERO);
        let calls = AtomicU32::new(0);

        let outcome = strategy
            .execute(
                |_| {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move { if n < 2 { Err("flaky") } else { Ok(n) } }
                },
                |_| RetryDecision::RETRY,
            )
            .await;

        assert_eq!(outcome.result, Ok(2));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.delays.len(), 2);
        assert!(outcome.delays[0] < outcome.delays[1]);
    }

    #[tokio::test]
    async fn test_execute_stops_on_fatal_error() {
        let strategy = RetryStrategy::new(5).with_base_delay(Duration::from_millis(1));

        let outcome: RetryOutcome<(), &str> = strategy
            .execute(|_| async { Err("fatal") }, |_| RetryDecision::Stop)
            .await;

        assert_eq!(outcome.attempts, 1);
        assert!(outcome.delays.is_empty());
    }

    #[tokio::test]
    async fn test_execute_respects_budget_and_floor() {
        let strategy = RetryStrategy::new(2)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(Duration::ZERO);

        let outcome: RetryOutcome<(), &str> = strategy
            .execute(
                |_| async { Err("throttled") },
                |_| RetryDecision::Retry {
                    floor: Some(Duration::from_millis(20)),
                },
            )
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.delays, vec![Duration::from_millis(20)]);
        assert!(outcome.result.is_err());
    }

    #[test]
    fn test_jitter_never_exceeds_cap() {
        let strategy = RetryStrategy::new(3)
            .with_base_delay(Duration::from_millis(40))
            .with_jitter(Duration::from_millis(500))
            .with_max_delay(Duration::from_millis(50));

        for _ in 0..20 {
            assert!(strategy.jittered_delay(1) <= Duration::from_millis(50));
        }
    }

    #[tokio::test]
    async fn test_server_floor_clamped_to_max_delay() {
        let strategy = RetryStrategy::new(2).with_max_delay(Duration::from_millis(50));
        let start = std::time::Instant::now();

        let outcome: RetryOutcome<(), &str> = strategy
            .execute(
                |_| async { Err("throttled") },
                |_| RetryDecision::Retry {
                    floor: Some(Duration::from_secs(1)),
                },
            )
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.delays, vec![Duration::from_millis(50)]);
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
