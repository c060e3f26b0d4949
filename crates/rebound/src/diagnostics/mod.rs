// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observing retries, rejections and circuit state changes.
//!
//! A [`Diagnostics`] value is passed to every [`Executor`][crate::Executor]
//! and [`CircuitBreaker`][crate::breaker::CircuitBreaker] of a client. It names
//! the client and routes each [`Event`] to up to three sinks:
//!
//! - a callback registered with [`Diagnostics::on_event`],
//! - structured `tracing` events (`logs` feature, `Diagnostics::enable_logs`),
//! - an OpenTelemetry `resilience.event` counter (`metrics` feature,
//!   `Diagnostics::enable_metrics`).
//!
//! # Examples
//!
//! ```
//! use rebound::{Diagnostics, Event};
//!
//! let diagnostics = Diagnostics::new("inventory").on_event(|event, args| {
//!     if let Event::StateChanged { from, to, .. } = event {
//!         println!("{}: circuit {from} -> {to}", args.client_name());
//!     }
//! });
//! # let _ = diagnostics;
//! ```

mod emitter;
mod event;

use std::borrow::Cow;

pub(crate) use emitter::Emitter;
pub use event::{Event, EventArgs};

pub(crate) const DEFAULT_CLIENT_NAME: &str = "default";

crate::utils::define_fn_wrapper!(pub(crate) OnEvent(Fn(event: &Event, args: EventArgs<'_>)));

/// Names a client and configures where its events go.
#[derive(Debug, Clone)]
#[must_use]
pub struct Diagnostics {
    name: Cow<'static, str>,
    on_event: Option<OnEvent>,
    #[cfg(any(feature = "logs", test))]
    logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<opentelemetry::metrics::Meter>,
}

impl Diagnostics {
    /// Creates diagnostics for the named client. Prefer `snake_case` names.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            on_event: None,
            #[cfg(any(feature = "logs", test))]
            logs_enabled: false,
            #[cfg(any(feature = "metrics", test))]
            meter: None,
        }
    }

    /// Registers a callback invoked synchronously for every event.
    ///
    /// Replaces any previously registered callback. The callback runs on the
    /// caller's task and should return quickly.
    pub fn on_event(self, f: impl Fn(&Event, EventArgs<'_>) + Send + Sync + 'static) -> Self {
        Self {
            on_event: Some(OnEvent::new(f)),
            ..self
        }
    }

    /// Emits structured `tracing` events.
    #[cfg(any(feature = "logs", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "logs")))]
    pub fn enable_logs(self) -> Self {
        Self {
            logs_enabled: true,
            ..self
        }
    }

    /// Reports events to a `resilience.event` counter created from `provider`.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    pub fn enable_metrics(self, provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        Self {
            meter: Some(crate::telemetry::metrics::create_meter(provider)),
            ..self
        }
    }

    /// Name of the client.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn emitter(&self) -> Emitter {
        Emitter {
            client_name: self.name.clone(),
            on_event: self.on_event.clone(),
            #[cfg(any(feature = "logs", test))]
            logs_enabled: self.logs_enabled,
            #[cfg(any(feature = "metrics", test))]
            event_reporter: self.meter.as_ref().map(crate::telemetry::metrics::create_event_counter),
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_NAME)
    }
}
