// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::constants::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_RECOVERY_TIMEOUT};
use crate::ConfigError;

/// How many calls may probe a half-open circuit at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(rename_all = "snake_case"))]
#[non_exhaustive]
pub enum ProbeMode {
    /// Every call admitted while half-open acts as a probe.
    ///
    /// Concurrent probes race and the last reported outcome decides the state.
    #[default]
    Concurrent,

    /// Only the first call admitted while half-open probes; others are rejected
    /// until it reports an outcome or releases its claim.
    Single,
}

/// How the circuit breaker trips and recovers.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use rebound::{BreakerConfig, ProbeMode};
///
/// let config = BreakerConfig::default()
///     .failure_threshold(3)
///     .recovery_timeout(Duration::from_secs(10))
///     .probe_mode(ProbeMode::Single);
///
/// config.validate()?;
/// # Ok::<(), rebound::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(any(feature = "serde", test), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(feature = "serde", test), serde(try_from = "RawBreakerConfig", into = "RawBreakerConfig"))]
#[must_use]
pub struct BreakerConfig {
    failure_threshold: u32,
    recovery_timeout: Duration,
    probe_mode: ProbeMode,
}

impl BreakerConfig {
    /// Sets the consecutive failures that open the circuit.
    ///
    /// A threshold of zero is rejected by [`validate`][Self::validate]; a
    /// breaker built from it opens on the first failure.
    pub const fn failure_threshold(mut self, failure_threshold: u32) -> Self {
        self.failure_threshold = failure_threshold;
        self
    }

    /// Sets how long the circuit stays open before a probe is admitted.
    pub const fn recovery_timeout(mut self, recovery_timeout: Duration) -> Self {
        self.recovery_timeout = recovery_timeout;
        self
    }

    /// Sets the half-open probing behavior.
    pub const fn probe_mode(mut self, probe_mode: ProbeMode) -> Self {
        self.probe_mode = probe_mode;
        self
    }

    /// Consecutive failures that open the circuit.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Time the circuit stays open before a probe is admitted.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.recovery_timeout
    }

    /// Half-open probing behavior.
    #[must_use]
    pub const fn mode(&self) -> ProbeMode {
        self.probe_mode
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroFailureThreshold`] when the threshold is zero.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }

        Ok(())
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            probe_mode: ProbeMode::default(),
        }
    }
}

#[cfg(any(feature = "serde", test))]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawBreakerConfig {
    failure_threshold: u32,
    recovery_timeout_ms: u64,
    probe_mode: ProbeMode,
}

#[cfg(any(feature = "serde", test))]
impl Default for RawBreakerConfig {
    fn default() -> Self {
        BreakerConfig::default().into()
    }
}

#[cfg(any(feature = "serde", test))]
impl From<BreakerConfig> for RawBreakerConfig {
    fn from(config: BreakerConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            recovery_timeout_ms: super::duration_to_millis(config.recovery_timeout),
            probe_mode: config.probe_mode,
        }
    }
}

#[cfg(any(feature = "serde", test))]
impl TryFrom<RawBreakerConfig> for BreakerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawBreakerConfig) -> Result<Self, Self::Error> {
        let config = Self::default()
            .failure_threshold(raw.failure_threshold)
            .recovery_timeout(Duration::from_millis(raw.recovery_timeout_ms))
            .probe_mode(raw.probe_mode);
        config.validate()?;
        Ok(config)
    }
}
