// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;
use std::time::Duration;

use super::constants::{
    DEFAULT_BASE_DELAY, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_RETRYABLE_STATUS_CODES,
};
use crate::ConfigError;

/// How failed attempts are retried.
///
/// Built once through [`RetryConfig::builder`] and read-only afterwards.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rebound::RetryConfig;
///
/// let config = RetryConfig::builder()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200))
///     .max_delay(Duration::from_secs(10))
///     .build()?;
///
/// assert_eq!(config.max_retries(), 5);
/// assert!(config.is_retryable_status(503));
/// # Ok::<(), rebound::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(try_from = "RawRetryConfig", into = "RawRetryConfig"))]
pub struct RetryConfig {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    retryable_status_codes: BTreeSet<u16>,
}

impl RetryConfig {
    /// Starts from the defaults.
    #[must_use]
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder { config: Self::default() }
    }

    /// Retries after the initial attempt. Zero disables retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the first retry, before jitter.
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Upper bound for any single delay, including server hints.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Width of the jitter band relative to the capped delay.
    #[must_use]
    pub const fn jitter_factor(&self) -> f64 {
        self.jitter_factor
    }

    /// Status codes considered transient.
    #[must_use]
    pub const fn retryable_status_codes(&self) -> &BTreeSet<u16> {
        &self.retryable_status_codes
    }

    /// Returns `true` if `code` is considered transient.
    #[must_use]
    pub fn is_retryable_status(&self, code: u16) -> bool {
        self.retryable_status_codes.contains(&code)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay > self.max_delay {
            return Err(ConfigError::BaseDelayExceedsMaxDelay {
                base_delay: self.base_delay,
                max_delay: self.max_delay,
            });
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ConfigError::InvalidJitterFactor(self.jitter_factor));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            retryable_status_codes: BTreeSet::from(DEFAULT_RETRYABLE_STATUS_CODES),
        }
    }
}

/// Builder for [`RetryConfig`]; unset values keep their defaults.
#[derive(Debug, Clone)]
#[must_use]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Sets the retries performed after the initial attempt.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.config.base_delay = base_delay;
        self
    }

    /// Sets the upper bound for any single delay.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.config.max_delay = max_delay;
        self
    }

    /// Sets the jitter factor, which must be within `[0, 1]`.
    pub fn jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.config.jitter_factor = jitter_factor;
        self
    }

    /// Replaces the set of transient status codes.
    pub fn retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.config.retryable_status_codes = codes.into_iter().collect();
        self
    }

    /// Adds a single transient status code to the current set.
    pub fn retry_on_status(mut self, code: u16) -> Self {
        self.config.retryable_status_codes.insert(code);
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `base_delay` exceeds `max_delay` or the
    /// jitter factor is outside `[0, 1]`.
    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(any(feature = "serde", test))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRetryConfig {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    retryable_status_codes: BTreeSet<u16>,
}

#[cfg(any(feature = "serde", test))]
impl Default for RawRetryConfig {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

#[cfg(any(feature = "serde", test))]
impl From<RetryConfig> for RawRetryConfig {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: super::duration_to_millis(config.base_delay),
            max_delay_ms: super::duration_to_millis(config.max_delay),
            jitter_factor: config.jitter_factor,
            retryable_status_codes: config.retryable_status_codes,
        }
    }
}

#[cfg(any(feature = "serde", test))]
impl TryFrom<RawRetryConfig> for RetryConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRetryConfig) -> Result<Self, Self::Error> {
        Self::builder()
            .max_retries(raw.max_retries)
            .base_delay(Duration::from_millis(raw.base_delay_ms))
            .max_delay(Duration::from_millis(raw.max_delay_ms))
            .jitter_factor(raw.jitter_factor)
            .retryable_status_codes(raw.retryable_status_codes)
            .build()
    }
}
