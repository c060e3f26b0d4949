// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::breaker::{CircuitBreaker, ProbeTicket};

/// Releases a single-probe claim unless the probe reported an outcome.
///
/// Covers both explicit cancellation and a dropped execution future.
#[derive(Debug)]
pub(super) struct ProbeGuard<'a> {
    breaker: &'a CircuitBreaker,
    ticket: Option<ProbeTicket>,
}

impl<'a> ProbeGuard<'a> {
    pub(super) const fn new(breaker: &'a CircuitBreaker, ticket: Option<ProbeTicket>) -> Self {
        Self { breaker, ticket }
    }

    /// The breaker has been told the outcome.
    pub(super) const fn disarm(&mut self) {
        self.ticket = None;
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.breaker.release_probe(ticket);
        }
    }
}
