// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use super::{Admission, CircuitState, ProbeTicket};
use crate::diagnostics::Emitter;
use crate::{BreakerConfig, Diagnostics, Event, ProbeMode};

/// Marks the absence of a recorded failure in `last_failure`.
const NO_FAILURE: u64 = u64::MAX;

/// Marks a free single probe slot in `probe_holder`.
const NO_PROBE: u64 = 0;

/// Three-state circuit breaker guarding one upstream endpoint.
///
/// Time is read through [`tokio::time::Instant`], so a paused tokio clock
/// drives the recovery timeout in tests.
///
/// # Examples
///
/// ```
/// use rebound::breaker::{Admission, CircuitBreaker, CircuitState};
/// use rebound::{BreakerConfig, Diagnostics};
///
/// let breaker = CircuitBreaker::new(BreakerConfig::default().failure_threshold(2), &Diagnostics::default());
///
/// breaker.on_failure();
/// breaker.on_failure();
///
/// assert_eq!(breaker.current_state(), CircuitState::Open);
/// assert!(matches!(breaker.admit(), Admission::Rejected { .. }));
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    // Nanoseconds from `origin` to the most recent failure.
    last_failure: AtomicU64,
    // Ticket of the call holding the single probe slot.
    probe_holder: AtomicU64,
    next_ticket: AtomicU64,
    origin: Instant,
    config: BreakerConfig,
    emitter: Emitter,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    #[must_use]
    pub fn new(config: BreakerConfig, diagnostics: &Diagnostics) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed.to_u8()),
            consecutive_failures: AtomicU32::new(0),
            last_failure: AtomicU64::new(NO_FAILURE),
            probe_holder: AtomicU64::new(NO_PROBE),
            next_ticket: AtomicU64::new(NO_PROBE),
            origin: Instant::now(),
            config,
            emitter: diagnostics.emitter(),
        }
    }

    /// Decides whether a call may proceed.
    ///
    /// An open circuit whose recovery timeout elapsed moves to half-open and
    /// admits the call as a probe. With [`ProbeMode::Single`] only one probe is
    /// admitted until it reports an outcome or calls
    /// [`release_probe`][Self::release_probe].
    pub fn admit(&self) -> Admission {
        self.evaluate(Instant::now())
    }

    /// Records a successful call: closes a half-open circuit and resets the
    /// failure count.
    pub fn on_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);

        if self.transition(CircuitState::HalfOpen, CircuitState::Closed) {
            self.probe_holder.store(NO_PROBE, Ordering::Release);
        }
    }

    /// Records a failed call: reopens a half-open circuit immediately and
    /// opens a closed one once the threshold is reached.
    pub fn on_failure(&self) {
        let failures = self.record_failure(Instant::now());

        match self.current_state() {
            CircuitState::HalfOpen => {
                if self.transition(CircuitState::HalfOpen, CircuitState::Open) {
                    self.probe_holder.store(NO_PROBE, Ordering::Release);
                }
            }
            CircuitState::Closed if failures >= self.config.threshold() => {
                self.transition(CircuitState::Closed, CircuitState::Open);
            }
            CircuitState::Closed | CircuitState::Open => {}
        }
    }

    /// Gives up a single-probe claim without recording an outcome.
    ///
    /// Used when a probe is cancelled. Only the claim made with `ticket` is
    /// released; a newer probe admitted after the circuit reopened keeps its
    /// slot. Has no effect in [`ProbeMode::Concurrent`].
    pub fn release_probe(&self, ticket: ProbeTicket) {
        // A failed exchange means the slot is free or held by someone else.
        let _ = self
            .probe_holder
            .compare_exchange(ticket.0, NO_PROBE, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Current state.
    #[must_use]
    pub fn current_state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Failures recorded since the last success.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// When the most recent failure was recorded.
    #[must_use]
    pub fn last_failure_time(&self) -> Option<Instant> {
        self.last_failure_offset()
            .map(|nanos| self.origin + Duration::from_nanos(nanos))
    }

    /// The configuration the breaker was created with.
    #[must_use]
    pub const fn config(&self) -> &BreakerConfig {
        &self.config
    }

    fn evaluate(&self, now: Instant) -> Admission {
        match self.current_state() {
            CircuitState::Closed => Admission::Allowed { probe: None },
            CircuitState::HalfOpen => self.claim_probe(),
            CircuitState::Open => {
                let elapsed = self
                    .last_failure_offset()
                    .map_or(Duration::MAX, |at| Duration::from_nanos(self.offset(now).saturating_sub(at)));
                let remaining = self.config.timeout().saturating_sub(elapsed);

                if !remaining.is_zero() {
                    return self.reject(remaining, CircuitState::Open);
                }

                if self.transition(CircuitState::Open, CircuitState::HalfOpen)
                    || self.current_state() == CircuitState::HalfOpen
                {
                    self.claim_probe()
                } else {
                    // Another call changed the state in between; decide again.
                    self.evaluate(now)
                }
            }
        }
    }

    fn claim_probe(&self) -> Admission {
        match self.config.mode() {
            ProbeMode::Concurrent => Admission::Allowed {
                probe: Some(ProbeTicket(NO_PROBE)),
            },
            ProbeMode::Single => {
                let ticket = self.issue_ticket();

                if self
                    .probe_holder
                    .compare_exchange(NO_PROBE, ticket, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    Admission::Allowed {
                        probe: Some(ProbeTicket(ticket)),
                    }
                } else {
                    self.reject(Duration::ZERO, CircuitState::HalfOpen)
                }
            }
        }
    }

    fn issue_ticket(&self) -> u64 {
        // Skip the free-slot marker when the counter wraps.
        match self.next_ticket.fetch_add(1, Ordering::Relaxed).wrapping_add(1) {
            NO_PROBE => self.issue_ticket(),
            ticket => ticket,
        }
    }

    fn reject(&self, retry_after: Duration, state: CircuitState) -> Admission {
        self.emitter.emit(&Event::Rejected { retry_after, state });
        Admission::Rejected { retry_after }
    }

    fn record_failure(&self, now: Instant) -> u32 {
        self.last_failure.store(self.offset(now), Ordering::Release);

        let previous = match self.consecutive_failures.fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
            Some(count.saturating_add(1))
        }) {
            Ok(count) | Err(count) => count,
        };

        previous.saturating_add(1)
    }

    /// Moves from `from` to `to`; only the caller that wins the exchange
    /// reports the change.
    fn transition(&self, from: CircuitState, to: CircuitState) -> bool {
        let changed = self
            .state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if changed {
            self.emitter.emit(&Event::StateChanged {
                from,
                to,
                consecutive_failures: self.consecutive_failures(),
            });
        }

        changed
    }

    fn last_failure_offset(&self) -> Option<u64> {
        match self.last_failure.load(Ordering::Acquire) {
            NO_FAILURE => None,
            nanos => Some(nanos),
        }
    }

    fn offset(&self, now: Instant) -> u64 {
        u64::try_from(now.saturating_duration_since(self.origin).as_nanos()).unwrap_or(NO_FAILURE - 1)
    }
}
