//! Backoff delay computation with optional jitter.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay grows across attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay every attempt.
    Fixed,
    /// Delay grows linearly with the attempt number.
    Linear,
    /// Delay doubles each attempt, capped at the maximum.
    Exponential,
}

/// Calculate the backoff delay for a retry attempt.
///
/// `attempt` is 1-indexed: the first retry is attempt 1. With jitter
/// enabled the delay is perturbed by a uniform ±10%, floored at zero.
pub fn compute_delay(
    strategy: BackoffStrategy,
    attempt: u32,
    base: Duration,
    max: Duration,
    jitter: bool,
) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let base_ms = base.as_millis() as u64;
    let delay_ms = match strategy {
        BackoffStrategy::Fixed => base_ms,
        BackoffStrategy::Linear => base_ms.saturating_mul(attempt as u64),
        BackoffStrategy::Exponential => {
            let exponential_base = 2u64.saturating_pow(attempt - 1);
            base_ms
                .saturating_mul(exponential_base)
                .min(max.as_millis() as u64)
        }
    };

    if !jitter {
        return Duration::from_millis(delay_ms);
    }

    // Perturb by up to ±10% of the computed delay
    let jitter_range = (delay_ms / 10) as i64;
    let offset = if jitter_range > 0 {
        rand::thread_rng().gen_range(-jitter_range..=jitter_range)
    } else {
        0
    };

    Duration::from_millis((delay_ms as i64 + offset).max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_sequence() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(1000);
        let expected = [100, 200, 400, 800, 1000, 1000];

        for (i, want) in expected.iter().enumerate() {
            let delay = compute_delay(BackoffStrategy::Exponential, i as u32 + 1, base, max, false);
            assert_eq!(delay.as_millis() as u64, *want, "attempt {}", i + 1);
        }
    }

    #[test]
    fn test_fixed_and_linear() {
        let base = Duration::from_millis(50);
        let max = Duration::from_secs(10);

        for attempt in 1..=4 {
            let fixed = compute_delay(BackoffStrategy::Fixed, attempt, base, max, false);
            assert_eq!(fixed.as_millis(), 50);

            let linear = compute_delay(BackoffStrategy::Linear, attempt, base, max, false);
            assert_eq!(linear.as_millis() as u64, 50 * attempt as u64);
        }
    }

    #[test]
    fn test_zero_attempt_has_no_delay() {
        let delay = compute_delay(
            BackoffStrategy::Exponential,
            0,
            Duration::from_millis(100),
            Duration::from_millis(1000),
            true,
        );
        assert_eq!(delay, Duration::from_millis(0));
    }

    #[test]
    fn test_jitter_stays_within_ten_percent() {
        let base = Duration::from_millis(1000);
        let max = Duration::from_millis(10_000);

        for _ in 0..50 {
            let delay = compute_delay(BackoffStrategy::Fixed, 1, base, max, true);
            let ms = delay.as_millis() as u64;
            assert!((900..=1100).contains(&ms), "jittered delay {} out of range", ms);
        }
    }
}
