//! Retry and polling policies: decide how long to wait.

use rand::Rng;
use std::time::Duration;

/// Retry policy for transient step failures.
///
/// Exponential backoff with jitter, bounded by a retry count and by the total
/// time a job may spend in the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,

    /// Upper bound on a single delay.
    pub max_delay: Duration,

    /// Relative jitter in `[0, 1]`: 0.2 spreads a delay over ±20%.
    pub jitter: f64,

    /// Ceiling on time since job creation; a retry past it is not scheduled.
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            jitter: 0.2,
            max_elapsed: Duration::from_secs(30 * 60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-indexed), without jitter.
    ///
    /// delay = base_delay * multiplier^(attempt - 1), capped at `max_delay`.
    ///
    /// Example with base_delay=2s, multiplier=2.0:
    /// - attempt 1: 2s
    /// - attempt 2: 4s
    /// - attempt 3: 8s
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// [`next_delay`](Self::next_delay) spread randomly by `jitter`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.next_delay(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return delay;
        }
        let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
        Duration::from_secs_f64(delay.as_secs_f64() * factor).min(self.max_delay)
    }

    /// Whether another retry fits in the budget.
    ///
    /// `retries_done` counts resumes already made, `elapsed` is time since the
    /// job was created and `delay` the wait the retry would need.
    pub fn allows(&self, retries_done: u32, elapsed: Duration, delay: Duration) -> bool {
        retries_done < self.max_retries && elapsed + delay <= self.max_elapsed
    }
}

/// Polling policy for container readiness.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Total wait after which a still-pending container counts as a transient failure.
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            multiplier: 1.5,
            max_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

impl PollPolicy {
    /// Grow the interval by `multiplier`, clamped to `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_interval)
    }
}

/// Tuning of a [`PublishService`](super::PublishService).
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub retry: RetryPolicy,
    pub poll: PollPolicy,
    /// How long a runner's claim on a job lasts without renewal.
    pub lease_ttl: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            poll: PollPolicy::default(),
            lease_ttl: Duration::from_secs(15 * 60),
        }
    }
}

impl PipelineConfig {
    /// Longest stretch a runner may go without persisting, and so without
    /// renewing its lease: a full polling phase followed by the largest
    /// backoff. `lease_ttl` must exceed it.
    pub fn unrenewed_window(&self) -> Duration {
        self.poll.timeout.saturating_add(self.retry.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_reasonable_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(2));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[test]
    fn exponential_backoff_increases() {
        let policy = RetryPolicy::default();

        let d1 = policy.next_delay(1);
        let d2 = policy.next_delay(2);
        let d3 = policy.next_delay(3);

        assert_eq!(d1, Duration::from_secs(2));
        assert_eq!(d2, Duration::from_secs(4));
        assert_eq!(d3, Duration::from_secs(8));
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(10), Duration::from_secs(60));
        assert_eq!(policy.next_delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let d = policy.jittered_delay(2).as_secs_f64();
            assert!((3.2..=4.8).contains(&d), "{d}");
        }
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.jittered_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn budget_checks_count_and_elapsed() {
        let policy = RetryPolicy::default();
        let small = Duration::from_secs(2);
        assert!(policy.allows(0, Duration::ZERO, small));
        assert!(policy.allows(2, Duration::ZERO, small));
        assert!(!policy.allows(3, Duration::ZERO, small));
        assert!(!policy.allows(0, Duration::from_secs(30 * 60 - 1), small));
    }

    #[test]
    fn poll_interval_grows_to_cap() {
        let poll = PollPolicy::default();
        assert_eq!(
            poll.next_interval(Duration::from_secs(5)),
            Duration::from_millis(7500)
        );
        assert_eq!(
            poll.next_interval(Duration::from_secs(25)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn default_lease_outlasts_the_unrenewed_window() {
        let config = PipelineConfig::default();
        assert_eq!(config.unrenewed_window(), Duration::from_secs(360));
        assert!(config.lease_ttl > config.unrenewed_window());
    }
}
