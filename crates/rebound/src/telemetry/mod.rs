// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attribute keys shared by logs and metrics.
//!
//! Log events are emitted through `tracing` when the `logs` feature is on and
//! [`Diagnostics::enable_logs`][crate::Diagnostics] was called. Metrics are
//! reported as a `resilience.event` counter when the `metrics` feature is on
//! and a meter provider was supplied.

#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;

/// Name of the client owning the executor or breaker.
pub const CLIENT_NAME: &str = "resilience.client.name";

/// Name of the reported event.
pub const EVENT_NAME: &str = "resilience.event.name";

/// Circuit state at the time of the event.
pub const CIRCUIT_STATE: &str = "circuit_breaker.state";

/// Zero-based index of the attempt.
pub const ATTEMPT_INDEX: &str = "resilience.attempt.index";
