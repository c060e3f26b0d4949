// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use tokio::time::Instant;

use crate::{Attempt, CircuitState, Classification};

/// Something observable happened inside an executor or circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// An attempt failed. `delay` is the backoff before the next attempt, or
    /// `None` when the failure ends the execution.
    AttemptFailed {
        /// The attempt that failed.
        attempt: Attempt,
        /// Retry budget of the execution.
        max_retries: u32,
        /// Upstream status code, if a response was obtained.
        status: Option<u16>,
        /// Whether the failure was considered transient.
        classification: Classification,
        /// Wait before the next attempt.
        delay: Option<Duration>,
        /// Circuit state after the failure was recorded.
        state: CircuitState,
    },

    /// The circuit moved between states.
    StateChanged {
        /// Previous state.
        from: CircuitState,
        /// New state.
        to: CircuitState,
        /// Consecutive failures at the time of the transition.
        consecutive_failures: u32,
    },

    /// A call was rejected by the breaker.
    Rejected {
        /// Remaining time until a probe is admitted.
        retry_after: Duration,
        /// State observed when rejecting: `Open` during the cooldown,
        /// `HalfOpen` while another call holds the single probe slot.
        state: CircuitState,
    },

    /// An execution was cancelled by its caller.
    Cancelled {
        /// Attempts started before cancellation.
        attempts: u32,
    },

    /// A fallback value replaced an unavailable upstream.
    FallbackUsed {
        /// Stable name of the error that triggered the fallback.
        reason: &'static str,
    },
}

impl Event {
    /// Stable name used in logs and metrics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AttemptFailed { delay: Some(_), .. } => "retry",
            Self::AttemptFailed { delay: None, .. } => "attempt_failed",
            Self::StateChanged { to, .. } => match to {
                CircuitState::Closed => "circuit_closed",
                CircuitState::Open => "circuit_opened",
                CircuitState::HalfOpen => "circuit_half_opened",
            },
            Self::Rejected { .. } => "circuit_rejected",
            Self::Cancelled { .. } => "cancelled",
            Self::FallbackUsed { .. } => "fallback",
        }
    }

    /// Circuit state the event reports on, if any.
    #[must_use]
    pub const fn circuit_state(&self) -> Option<CircuitState> {
        match self {
            Self::AttemptFailed { state, .. } => Some(*state),
            Self::StateChanged { to, .. } => Some(*to),
            Self::Rejected { state, .. } => Some(*state),
            Self::Cancelled { .. } | Self::FallbackUsed { .. } => None,
        }
    }
}

/// Context passed alongside every [`Event`].
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct EventArgs<'a> {
    pub(crate) client_name: &'a str,
    pub(crate) at: Instant,
}

impl EventArgs<'_> {
    /// Name of the client that emitted the event.
    #[must_use]
    pub const fn client_name(&self) -> &str {
        self.client_name
    }

    /// When the event was emitted.
    #[must_use]
    pub const fn at(&self) -> Instant {
        self.at
    }
}
