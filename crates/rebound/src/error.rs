// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::Failure;

/// Terminal outcome of an execution that did not produce a value.
///
/// Circuit breaker transitions never surface here mid-call; the breaker only
/// shows up as [`Error::CircuitOpen`] when the call is rejected up front.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The circuit is open and the call was rejected without invoking the operation.
    #[error("circuit open, retry after {retry_after:?}")]
    CircuitOpen {
        /// Remaining time until the circuit admits a probe.
        retry_after: Duration,
    },

    /// The operation failed in a way that retrying cannot fix.
    #[error("request failed after {attempts} attempt(s) and was not retried")]
    NonRetryableFailure {
        /// Attempts made, including the failing one.
        attempts: u32,
        /// The last failure.
        #[source]
        cause: Failure,
    },

    /// Every attempt failed with a transient failure.
    #[error("retries exhausted after {attempts} attempt(s)")]
    RetriesExhausted {
        /// Attempts made, including the failing one.
        attempts: u32,
        /// The last failure.
        #[source]
        cause: Failure,
    },

    /// The execution was cancelled while an attempt or a backoff wait was in progress.
    #[error("request cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts started before cancellation.
        attempts: u32,
    },
}

impl Error {
    /// Returns `true` when the upstream is currently unavailable: the circuit
    /// is open or transient failures persisted through every retry.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. } | Self::RetriesExhausted { .. })
    }

    /// Returns `true` when the request itself was rejected by the upstream.
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::NonRetryableFailure { .. })
    }

    /// The failure of the last attempt, if an attempt failed.
    #[must_use]
    pub const fn cause(&self) -> Option<&Failure> {
        match self {
            Self::NonRetryableFailure { cause, .. } | Self::RetriesExhausted { cause, .. } => Some(cause),
            Self::CircuitOpen { .. } | Self::Cancelled { .. } => None,
        }
    }

    /// Attempts made before the execution ended.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::CircuitOpen { .. } => 0,
            Self::NonRetryableFailure { attempts, .. }
            | Self::RetriesExhausted { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }

    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            Self::CircuitOpen { .. } => "circuit_open",
            Self::NonRetryableFailure { .. } => "non_retryable_failure",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// A configuration value violates its constraints.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The base delay is larger than the maximum delay.
    #[error("base delay {base_delay:?} exceeds max delay {max_delay:?}")]
    BaseDelayExceedsMaxDelay {
        /// Configured base delay.
        base_delay: Duration,
        /// Configured maximum delay.
        max_delay: Duration,
    },

    /// The jitter factor is not a finite number within `[0, 1]`.
    #[error("jitter factor must be within [0, 1], got {0}")]
    InvalidJitterFactor(f64),

    /// The circuit breaker failure threshold is zero.
    #[error("failure threshold must be greater than zero")]
    ZeroFailureThreshold,
}
