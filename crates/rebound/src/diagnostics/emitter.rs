// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;

use tokio::time::Instant;

use super::{Event, EventArgs, OnEvent};

/// Routes events of one client to its configured sinks.
#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    pub(crate) client_name: Cow<'static, str>,
    pub(crate) on_event: Option<OnEvent>,
    #[cfg(any(feature = "logs", test))]
    pub(crate) logs_enabled: bool,
    #[cfg(any(feature = "metrics", test))]
    pub(crate) event_reporter: Option<opentelemetry::metrics::Counter<u64>>,
}

impl Emitter {
    pub(crate) fn emit(&self, event: &Event) {
        if let Some(on_event) = &self.on_event {
            on_event.call(
                event,
                EventArgs {
                    client_name: &self.client_name,
                    at: Instant::now(),
                },
            );
        }

        #[cfg(any(feature = "logs", test))]
        if self.logs_enabled {
            self.log(event);
        }

        #[cfg(any(feature = "metrics", test))]
        if let Some(reporter) = &self.event_reporter {
            reporter.add(1, &self.attributes(event));
        }
    }

    #[cfg(any(feature = "logs", test))]
    fn log(&self, event: &Event) {
        use crate::CircuitState;

        match *event {
            Event::AttemptFailed {
                attempt,
                max_retries,
                status,
                classification,
                delay: Some(delay),
                state,
            } => tracing::event!(
                name: "rebound.retry",
                tracing::Level::WARN,
                client.name = %self.client_name,
                resilience.attempt.index = attempt.index(),
                resilience.attempt.max_retries = max_retries,
                resilience.failure.status = status,
                resilience.failure.classification = classification.as_str(),
                resilience.retry.delay = delay.as_secs_f32(),
                circuit_breaker.state = state.as_str(),
            ),
            Event::AttemptFailed {
                attempt,
                max_retries,
                status,
                classification,
                delay: None,
                state,
            } => tracing::event!(
                name: "rebound.attempt.failed",
                tracing::Level::WARN,
                client.name = %self.client_name,
                resilience.attempt.index = attempt.index(),
                resilience.attempt.max_retries = max_retries,
                resilience.failure.status = status,
                resilience.failure.classification = classification.as_str(),
                circuit_breaker.state = state.as_str(),
            ),
            Event::StateChanged {
                from,
                to: CircuitState::Open,
                consecutive_failures,
            } => tracing::event!(
                name: "rebound.circuit_breaker.opened",
                tracing::Level::WARN,
                client.name = %self.client_name,
                circuit_breaker.state = CircuitState::Open.as_str(),
                circuit_breaker.previous_state = from.as_str(),
                circuit_breaker.consecutive_failures = consecutive_failures,
            ),
            Event::StateChanged {
                from,
                to: CircuitState::HalfOpen,
                consecutive_failures,
            } => tracing::event!(
                name: "rebound.circuit_breaker.half_opened",
                tracing::Level::INFO,
                client.name = %self.client_name,
                circuit_breaker.state = CircuitState::HalfOpen.as_str(),
                circuit_breaker.previous_state = from.as_str(),
                circuit_breaker.consecutive_failures = consecutive_failures,
            ),
            Event::StateChanged {
                from,
                to: CircuitState::Closed,
                consecutive_failures,
            } => tracing::event!(
                name: "rebound.circuit_breaker.closed",
                tracing::Level::INFO,
                client.name = %self.client_name,
                circuit_breaker.state = CircuitState::Closed.as_str(),
                circuit_breaker.previous_state = from.as_str(),
                circuit_breaker.consecutive_failures = consecutive_failures,
            ),
            Event::Rejected { retry_after, state } => tracing::event!(
                name: "rebound.circuit_breaker.rejected",
                tracing::Level::WARN,
                client.name = %self.client_name,
                circuit_breaker.state = state.as_str(),
                resilience.retry_after = retry_after.as_secs_f32(),
            ),
            Event::Cancelled { attempts } => tracing::event!(
                name: "rebound.cancelled",
                tracing::Level::INFO,
                client.name = %self.client_name,
                resilience.attempts = attempts,
            ),
            Event::FallbackUsed { reason } => tracing::event!(
                name: "rebound.fallback",
                tracing::Level::WARN,
                client.name = %self.client_name,
                resilience.fallback.reason = reason,
            ),
        }
    }

    #[cfg(any(feature = "metrics", test))]
    fn attributes(&self, event: &Event) -> Vec<opentelemetry::KeyValue> {
        use opentelemetry::KeyValue;

        use crate::telemetry::{ATTEMPT_INDEX, CIRCUIT_STATE, CLIENT_NAME, EVENT_NAME};

        let mut attributes = vec![
            KeyValue::new(CLIENT_NAME, self.client_name.clone()),
            KeyValue::new(EVENT_NAME, event.name()),
        ];

        if let Some(state) = event.circuit_state() {
            attributes.push(KeyValue::new(CIRCUIT_STATE, state.as_str()));
        }

        if let Event::AttemptFailed { attempt, .. } = event {
            attributes.push(KeyValue::new(ATTEMPT_INDEX, i64::from(attempt.index())));
        }

        attributes
    }
}
