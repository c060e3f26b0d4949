// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Runs calls against a simulated flaky upstream.
//!
//! The first calls fail with transient status codes and are retried with
//! backoff. Once the upstream goes down completely the circuit opens, later
//! calls are rejected and served from a fallback, and after the recovery
//! timeout a probe closes the circuit again. Log output shows each retry and
//! state change.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rebound::{BreakerConfig, Diagnostics, Executor, Failure, RetryConfig, RetryHint};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

struct FlakyUpstream {
    calls: AtomicU32,
}

impl FlakyUpstream {
    async fn get(&self) -> Result<String, Failure> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(5)).await;

        match call {
            0 => Err(Failure::status(503).with_message("warming up")),
            1 => Err(Failure::status(429).retry_after(RetryHint::Seconds(0.05))),
            2..=8 => Err(Failure::network().with_message("connection refused")),
            _ => Ok(format!("response #{call}")),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).init();

    let upstream = FlakyUpstream { calls: AtomicU32::new(0) };
    let diagnostics = Diagnostics::new("flaky_upstream").enable_logs();

    let executor = Executor::builder(&diagnostics)
        .retry_config(
            RetryConfig::builder()
                .max_retries(2)
                .base_delay(Duration::from_millis(20))
                .max_delay(Duration::from_millis(200))
                .build()?,
        )
        .breaker_config(
            BreakerConfig::default()
                .failure_threshold(4)
                .recovery_timeout(Duration::from_millis(300)),
        )
        .build();

    for round in 0..6 {
        let result = executor
            .run_with_fallback(|| upstream.get(), |error| Some(format!("cached response ({error})")))
            .await;

        match result {
            Ok(body) => println!("round {round}: {body}"),
            Err(error) => println!("round {round}: failed: {error}"),
        }

        println!("round {round}: circuit is {}", executor.breaker().current_state());
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    Ok(())
}
