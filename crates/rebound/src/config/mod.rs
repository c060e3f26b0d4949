// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Immutable settings for retries and circuit breaking.
//!
//! Both configurations start from documented defaults and are read-only once
//! built. With the `serde` feature they can be loaded from any serde format;
//! missing fields take their defaults and durations are expressed in
//! milliseconds (`base_delay_ms`, `max_delay_ms`, `recovery_timeout_ms`).

mod breaker;
mod constants;
mod retry;

pub use breaker::{BreakerConfig, ProbeMode};
pub use constants::{
    DEFAULT_BASE_DELAY, DEFAULT_FAILURE_THRESHOLD, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES,
    DEFAULT_RECOVERY_TIMEOUT, DEFAULT_RETRYABLE_STATUS_CODES,
};
pub use retry::{RetryConfig, RetryConfigBuilder};

pub(crate) fn duration_to_millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
