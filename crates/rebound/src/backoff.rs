// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Delay computation between attempts.
//!
//! The delay before retry `n` (zero-based index of the attempt that failed) is
//! `min(base_delay × 2^n, max_delay)`, spread by a jitter band centered on that
//! value:
//!
//! ```text
//! jittered = capped + capped × jitter_factor × (u − 0.5),  u ∈ [0, 1)
//! ```
//!
//! The result is clamped into `[0, max_delay]` and floored to whole
//! milliseconds. A server hint replaces the computation entirely and is only
//! capped by `max_delay`.

use std::time::Duration;

use crate::{RandomSource, RetryConfig};

/// Shift applied to a `[0, 1)` draw to center the jitter band on zero.
const JITTER_CENTER: f64 = 0.5;

/// Computes the delay to wait after the attempt at `attempt_index` failed.
///
/// `hint` is a server retry hint already resolved to a duration; see
/// [`RetryHint::resolve`][crate::RetryHint::resolve].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rebound::{RandomSource, RetryConfig, backoff};
///
/// let config = RetryConfig::builder().jitter_factor(0.0).build()?;
/// let rnd = RandomSource::default();
///
/// assert_eq!(backoff::delay(0, &config, None, &rnd), Duration::from_secs(1));
/// assert_eq!(backoff::delay(2, &config, None, &rnd), Duration::from_secs(4));
/// assert_eq!(backoff::delay(2, &config, Some(Duration::from_secs(2)), &rnd), Duration::from_secs(2));
/// # Ok::<(), rebound::ConfigError>(())
/// ```
#[must_use]
pub fn delay(attempt_index: u32, config: &RetryConfig, hint: Option<Duration>, rnd: &RandomSource) -> Duration {
    let max_delay = config.max_delay();

    if let Some(hint) = hint {
        return floor_to_millis(hint.min(max_delay));
    }

    let capped = exponential(config.base_delay(), attempt_index).min(max_delay);
    jittered(capped, max_delay, config.jitter_factor(), rnd)
}

fn exponential(base: Duration, attempt_index: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }

    2_u32
        .checked_pow(attempt_index)
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(Duration::MAX)
}

fn jittered(capped: Duration, max_delay: Duration, jitter_factor: f64, rnd: &RandomSource) -> Duration {
    let ms = capped.as_secs_f64() * 1000.0;
    let offset = ms * jitter_factor * (rnd.next_f64() - JITTER_CENTER);
    let max_ms = max_delay.as_secs_f64() * 1000.0;

    millis_to_duration((ms + offset).min(max_ms))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the value is floored and positive; float to int casts saturate"
)]
fn millis_to_duration(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }

    Duration::from_millis(ms.floor() as u64)
}

fn floor_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(crate::config::duration_to_millis(duration))
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_ms: u64, max_ms: u64, jitter: f64) -> RetryConfig {
        RetryConfig::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(Duration::from_millis(max_ms))
            .jitter_factor(jitter)
            .build()
            .unwrap()
    }

    #[test]
    fn exponential_without_jitter() {
        let config = config(1000, 30_000, 0.0);
        let rnd = RandomSource::fixed(0.9);

        let delays: Vec<_> = (0..6).map(|i| delay(i, &config, None, &rnd).as_millis()).collect();

        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16_000, 30_000]);
    }

    #[test]
    fn centered_draw_leaves_delay_unchanged() {
        let config = config(1000, 30_000, 0.2);
        let rnd = RandomSource::fixed(0.5);

        assert_eq!(delay(0, &config, None, &rnd), Duration::from_millis(1000));
        assert_eq!(delay(1, &config, None, &rnd), Duration::from_millis(2000));
    }

    #[test]
    fn lowest_draw_gives_lower_band_edge() {
        let config = config(1000, 30_000, 0.2);
        let rnd = RandomSource::fixed(0.0);

        assert_eq!(delay(0, &config, None, &rnd), Duration::from_millis(900));
    }

    #[test]
    fn highest_draw_approaches_upper_band_edge() {
        let config = config(1000, 30_000, 0.5);

        assert_eq!(delay(0, &config, None, &RandomSource::fixed(0.0)), Duration::from_millis(750));
        assert_eq!(delay(0, &config, None, &RandomSource::fixed(1.0)), Duration::from_millis(1250));
        assert_eq!(delay(0, &config, None, &RandomSource::fixed(0.4)), Duration::from_millis(950));
    }

    #[test]
    fn jitter_never_exceeds_max_delay() {
        let config = config(1000, 1000, 0.5);

        assert_eq!(delay(0, &config, None, &RandomSource::fixed(1.0)), Duration::from_millis(1000));
        assert_eq!(delay(5, &config, None, &RandomSource::fixed(1.0)), Duration::from_millis(1000));
    }

    #[test]
    fn delay_stays_within_band_for_random_draws() {
        let config = config(100, 5_000, 1.0);
        let rnd = RandomSource::seeded(12345);

        for attempt in 0..64 {
            let capped = (100_u128 << attempt.min(40)).min(5_000);
            let value = delay(attempt, &config, None, &rnd).as_millis();

            assert!(value <= 5_000, "attempt {attempt}: {value}ms over max");
            assert!(value >= capped / 2, "attempt {attempt}: {value}ms under band");
        }
    }

    #[test]
    fn large_attempt_index_saturates() {
        let config = config(1000, 30_000, 0.0);
        let rnd = RandomSource::default();

        assert_eq!(delay(u32::MAX, &config, None, &rnd), Duration::from_secs(30));
    }

    #[test]
    fn zero_base_delay_gives_zero() {
        let config = config(0, 1000, 0.5);
        let rnd = RandomSource::fixed(1.0);

        assert_eq!(delay(0, &config, None, &rnd), Duration::ZERO);
        assert_eq!(delay(100, &config, None, &rnd), Duration::ZERO);
    }

    #[test]
    fn hint_takes_precedence() {
        let config = config(1000, 30_000, 0.2);
        let rnd = RandomSource::fixed(0.0);

        assert_eq!(
            delay(3, &config, Some(Duration::from_secs(2)), &rnd),
            Duration::from_secs(2)
        );
        assert_eq!(delay(3, &config, Some(Duration::ZERO), &rnd), Duration::ZERO);
    }

    #[test]
    fn hint_is_capped_by_max_delay() {
        let config = config(1000, 30_000, 0.2);
        let rnd = RandomSource::default();

        assert_eq!(
            delay(0, &config, Some(Duration::from_secs(120)), &rnd),
            Duration::from_secs(30)
        );
        assert_eq!(delay(0, &config, Some(Duration::MAX), &rnd), Duration::from_secs(30));
    }

    #[test]
    fn hint_is_floored_to_millis() {
        let config = config(1000, 30_000, 0.0);
        let rnd = RandomSource::default();

        assert_eq!(
            delay(0, &config, Some(Duration::from_micros(1500)), &rnd),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn sub_millisecond_fraction_is_floored() {
        let config = config(3, 30_000, 0.5);
        let rnd = RandomSource::fixed(0.0);

        // 3ms × 0.75 = 2.25ms
        assert_eq!(delay(0, &config, None, &rnd), Duration::from_millis(2));
    }
}
