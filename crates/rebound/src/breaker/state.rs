// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Calls flow normally and failures are counted.
    Closed,
    /// Calls are rejected until the recovery timeout elapses.
    Open,
    /// Calls are admitted as probes; the next outcome closes or reopens the circuit.
    HalfOpen,
}

impl CircuitState {
    /// Stable name used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    pub(super) const fn to_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }

    pub(super) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            _ => Self::HalfOpen,
        }
    }
}

impl Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the call admitted as a probe.
///
/// Hand it back through [`CircuitBreaker::release_probe`][super::CircuitBreaker::release_probe]
/// when the probe ends without an outcome. A ticket only ever releases its own
/// claim, so a stale ticket from an earlier half-open period has no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeTicket(pub(super) u64);

/// Decision of [`CircuitBreaker::admit`][super::CircuitBreaker::admit].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed.
    Allowed {
        /// Set when the call probes a half-open circuit; its outcome decides
        /// the next state.
        probe: Option<ProbeTicket>,
    },
    /// The call may not proceed.
    Rejected {
        /// Remaining time until a probe is admitted. Zero when another call
        /// currently holds the single probe slot.
        retry_after: Duration,
    },
}

impl Admission {
    /// Returns `true` if the call may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns `true` if the call was admitted as a probe.
    #[must_use]
    pub const fn is_probe(&self) -> bool {
        matches!(self, Self::Allowed { probe: Some(_) })
    }

    /// The probe ticket, if the call was admitted as a probe.
    #[must_use]
    pub const fn probe(&self) -> Option<ProbeTicket> {
        match self {
            Self::Allowed { probe } => *probe,
            Self::Rejected { .. } => None,
        }
    }
}
