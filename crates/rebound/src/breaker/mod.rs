// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Circuit breaking for a single upstream endpoint.
//!
//! A [`CircuitBreaker`] tracks consecutive failures and suspends traffic once
//! they reach the configured threshold. After the recovery timeout it lets
//! probe calls through to find out whether the upstream recovered.
//!
//! ```text
//!            failures >= threshold
//!   Closed ─────────────────────────▶ Open
//!     ▲                                │
//!     │ probe succeeds                 │ recovery timeout elapsed
//!     │                                ▼
//!     └────────────────────────── HalfOpen
//!                                      │
//!          probe fails: back to Open ◀─┘
//! ```
//!
//! All state lives in atomics, so [`CircuitBreaker::admit`] never blocks and
//! no lock is held across a call. Counters updated by concurrent calls are a
//! best-effort approximation. One breaker is meant to be owned per client and
//! shared between executors through an `Arc`.

mod circuit_breaker;
mod state;

pub use circuit_breaker::CircuitBreaker;
pub use state::{Admission, CircuitState, ProbeTicket};
