// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Retries and circuit breaking for calls to a single upstream endpoint.
//!
//! An [`Executor`] wraps each call to an upstream service. It classifies
//! failures as transient or permanent, retries transient ones with exponential
//! backoff and jitter while honoring server retry hints, and consults a
//! [`CircuitBreaker`][breaker::CircuitBreaker] that suspends traffic to an
//! endpoint that keeps failing and probes it for recovery.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rebound::{BreakerConfig, Diagnostics, Error, Executor, Failure, RetryConfig};
//!
//! # async fn get_profile(id: u64) -> Result<String, Failure> { Ok(format!("profile {id}")) }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let diagnostics = Diagnostics::new("profiles");
//!
//! let executor = Executor::builder(&diagnostics)
//!     .retry_config(
//!         RetryConfig::builder()
//!             .max_retries(2)
//!             .base_delay(Duration::from_millis(200))
//!             .build()?,
//!     )
//!     .breaker_config(BreakerConfig::default().failure_threshold(3))
//!     .build();
//!
//! match executor.run(|| get_profile(7)).await {
//!     Ok(profile) => println!("{profile}"),
//!     Err(error) if error.is_unavailable() => println!("profiles are unavailable: {error}"),
//!     Err(error) => return Err(error.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Backoff waits and [`Executor::run_with_timeout`] use Tokio timers, so
//! executions must be polled inside a Tokio runtime with the `time` driver
//! enabled. Outside one, the first retry panics.
//!
//! # Failures
//!
//! The operation reports failed attempts as [`Failure`] values:
//!
//! - [`Failure::network`] when no response was obtained; always retried.
//! - [`Failure::status`] with the upstream status code; retried when the code
//!   is listed in [`RetryConfig::retryable_status_codes`].
//! - [`Failure::other`] for client-side problems; never retried.
//!
//! A [`RetryHint`] attached to a failure replaces the computed backoff, capped
//! by [`RetryConfig::max_delay`].
//!
//! # Sharing a Breaker
//!
//! Breakers are never global. Create one per upstream and hand the same
//! `Arc` to every executor talking to it through
//! [`ExecutorBuilder::breaker`].
//!
//! # Features
//!
//! - `logs`: structured `tracing` events, see `Diagnostics::enable_logs`.
//! - `metrics`: an OpenTelemetry event counter, see
//!   `Diagnostics::enable_metrics`.
//! - `serde`: `Serialize`/`Deserialize` for [`RetryConfig`],
//!   [`BreakerConfig`] and [`ProbeMode`].
//! - `http`: `Failure::from_response_parts` for `http` responses.

mod attempt;
pub mod backoff;
pub mod breaker;
pub mod classify;
mod config;
mod diagnostics;
mod error;
mod executor;
mod failure;
mod rnd;
pub mod telemetry;
mod utils;

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;

pub use attempt::Attempt;
pub use classify::Classification;
pub use config::{
    BreakerConfig, DEFAULT_BASE_DELAY, DEFAULT_FAILURE_THRESHOLD, DEFAULT_JITTER_FACTOR, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_RETRIES, DEFAULT_RECOVERY_TIMEOUT, DEFAULT_RETRYABLE_STATUS_CODES, ProbeMode, RetryConfig,
    RetryConfigBuilder,
};
pub use diagnostics::{Diagnostics, Event, EventArgs};
pub use error::{ConfigError, Error};
pub use executor::{Executor, ExecutorBuilder};
pub use failure::{Failure, FailureKind, RetryHint};
pub use rnd::RandomSource;

/// Re-exported for matching on events without importing [`breaker`].
pub use breaker::CircuitState;
