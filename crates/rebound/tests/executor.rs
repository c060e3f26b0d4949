// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the executor using only the public API.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rebound::breaker::{CircuitBreaker, CircuitState};
use rebound::{BreakerConfig, Diagnostics, Error, Event, Executor, Failure, ProbeMode, RandomSource, RetryConfig};

fn no_retries() -> RetryConfig {
    RetryConfig::builder().max_retries(0).build().unwrap()
}

#[tokio::test(start_paused = true)]
async fn circuit_opens_rejects_and_recovers() {
    let executor = Executor::builder(&Diagnostics::new("scenario"))
        .retry_config(no_retries())
        .breaker_config(
            BreakerConfig::default()
                .failure_threshold(2)
                .recovery_timeout(Duration::from_secs(1)),
        )
        .build();
    let calls = AtomicU32::new(0);
    let failing = || {
        calls.fetch_add(1, Ordering::Relaxed);
        async { Err::<&str, _>(Failure::status(503)) }
    };

    let first = executor.run(failing).await.unwrap_err();
    assert!(matches!(first, Error::RetriesExhausted { attempts: 1, .. }));
    assert_eq!(executor.breaker().current_state(), CircuitState::Closed);

    let second = executor.run(failing).await.unwrap_err();
    assert!(matches!(second, Error::RetriesExhausted { attempts: 1, .. }));
    assert_eq!(executor.breaker().current_state(), CircuitState::Open);

    let third = executor.run(failing).await.unwrap_err();
    assert!(matches!(third, Error::CircuitOpen { .. }));
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    tokio::time::advance(Duration::from_secs(1)).await;

    let value = executor.run(|| async { Ok::<_, Failure>("recovered") }).await.unwrap();
    assert_eq!(value, "recovered");
    assert_eq!(executor.breaker().current_state(), CircuitState::Closed);
    assert_eq!(executor.breaker().consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_probe_reopens_circuit() {
    let executor = Executor::builder(&Diagnostics::default())
        .retry_config(no_retries())
        .breaker_config(
            BreakerConfig::default()
                .failure_threshold(1)
                .recovery_timeout(Duration::from_secs(5)),
        )
        .build();

    let _ = executor.run(|| async { Err::<(), _>(Failure::network()) }).await;
    tokio::time::advance(Duration::from_secs(5)).await;

    let probe = executor.run(|| async { Err::<(), _>(Failure::network()) }).await.unwrap_err();
    assert!(matches!(probe, Error::RetriesExhausted { .. }));
    assert_eq!(executor.breaker().current_state(), CircuitState::Open);

    let rejected = executor.run(|| async { Ok::<_, Failure>(()) }).await.unwrap_err();
    let Error::CircuitOpen { retry_after } = rejected else {
        panic!("expected a rejection, got {rejected:?}");
    };
    assert_eq!(retry_after, Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn executors_share_one_breaker() {
    let diagnostics = Diagnostics::new("shared");
    let breaker = Arc::new(CircuitBreaker::new(
        BreakerConfig::default().failure_threshold(2),
        &diagnostics,
    ));
    let reads = Executor::builder(&diagnostics)
        .retry_config(no_retries())
        .breaker(Arc::clone(&breaker))
        .build();
    let writes = Executor::builder(&diagnostics)
        .retry_config(no_retries())
        .breaker(Arc::clone(&breaker))
        .build();

    let _ = reads.run(|| async { Err::<(), _>(Failure::status(500)) }).await;
    let _ = writes.run(|| async { Err::<(), _>(Failure::status(500)) }).await;

    assert_eq!(breaker.current_state(), CircuitState::Open);
    assert!(reads.run(|| async { Ok::<_, Failure>(()) }).await.unwrap_err().is_unavailable());
}

#[tokio::test(start_paused = true)]
async fn single_probe_mode_rejects_concurrent_probes() {
    let executor = Executor::builder(&Diagnostics::default())
        .retry_config(no_retries())
        .breaker_config(
            BreakerConfig::default()
                .failure_threshold(1)
                .recovery_timeout(Duration::from_secs(1))
                .probe_mode(ProbeMode::Single),
        )
        .build();

    let _ = executor.run(|| async { Err::<(), _>(Failure::network()) }).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let slow_probe = executor.run(|| async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, Failure>("probe")
    });
    let competing = async {
        tokio::task::yield_now().await;
        executor.run(|| async { Ok::<_, Failure>("competitor") }).await
    };

    let (probe, competitor) = tokio::join!(slow_probe, competing);

    assert_eq!(probe.unwrap(), "probe");
    assert!(matches!(competitor, Err(Error::CircuitOpen { retry_after }) if retry_after == Duration::ZERO));
    assert_eq!(executor.breaker().current_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn concurrent_probe_mode_admits_every_call() {
    let executor = Executor::builder(&Diagnostics::default())
        .retry_config(no_retries())
        .breaker_config(
            BreakerConfig::default()
                .failure_threshold(1)
                .recovery_timeout(Duration::from_secs(1)),
        )
        .build();

    let _ = executor.run(|| async { Err::<(), _>(Failure::network()) }).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let slow = executor.run(|| async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok::<_, Failure>(1)
    });
    let fast = async {
        tokio::task::yield_now().await;
        executor.run(|| async { Ok::<_, Failure>(2) }).await
    };

    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap(), 1);
    assert_eq!(fast.unwrap(), 2);
    assert_eq!(executor.breaker().current_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn diagnostics_see_every_failed_attempt() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);
    let diagnostics = Diagnostics::new("observed").on_event(move |event, args| {
        assert_eq!(args.client_name(), "observed");
        events_clone.lock().unwrap().push(*event);
    });

    let executor = Executor::builder(&diagnostics)
        .retry_config(
            RetryConfig::builder()
                .max_retries(2)
                .base_delay(Duration::from_millis(10))
                .build()
                .unwrap(),
        )
        .random_source(RandomSource::seeded(3))
        .build();

    let _ = executor.run(|| async { Err::<(), _>(Failure::status(503)) }).await;

    let events = events.lock().unwrap();
    let failed: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::AttemptFailed { attempt, delay, .. } => Some((attempt.index(), delay.is_some())),
            _ => None,
        })
        .collect();

    assert_eq!(failed, vec![(0, true), (1, true), (2, false)]);
}

#[tokio::test(start_paused = true)]
async fn timeout_cancels_without_counting_a_failure() {
    let executor = Executor::new(&Diagnostics::default());

    let error = executor
        .run_with_timeout(
            || async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, Failure>(())
            },
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();

    assert!(matches!(error, Error::Cancelled { attempts: 1 }));
    assert_eq!(executor.breaker().consecutive_failures(), 0);
    assert_eq!(executor.breaker().current_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn fallback_serves_cached_value_while_open() {
    let executor = Executor::builder(&Diagnostics::default())
        .retry_config(no_retries())
        .breaker_config(BreakerConfig::default().failure_threshold(1))
        .build();

    let _ = executor.run(|| async { Err::<Vec<u32>, _>(Failure::network()) }).await;

    let items = executor
        .run_with_fallback(|| async { Ok::<_, Failure>(vec![1, 2, 3]) }, |_| Some(Vec::new()))
        .await
        .unwrap();

    assert!(items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn default_retry_budget_invokes_four_times() {
    let executor = Executor::new(&Diagnostics::default());
    let calls = AtomicU32::new(0);

    let error = executor
        .run(|| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err::<(), _>(Failure::status(503)) }
        })
        .await
        .unwrap_err();

    assert_eq!(executor.retry_config().max_retries(), 3);
    assert_eq!(calls.load(Ordering::Relaxed), 4);
    assert!(matches!(error, Error::RetriesExhausted { attempts: 4, .. }));
    assert_eq!(executor.breaker().current_state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn dropped_stale_probe_keeps_newer_probe_slot() {
    let executor = Executor::builder(&Diagnostics::default())
        .retry_config(no_retries())
        .breaker_config(
            BreakerConfig::default()
                .failure_threshold(1)
                .recovery_timeout(Duration::from_secs(1))
                .probe_mode(ProbeMode::Single),
        )
        .build();

    let _ = executor.run(|| async { Err::<(), _>(Failure::network()) }).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let stale = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run(std::future::pending::<Result<(), Failure>>).await }
    });
    tokio::task::yield_now().await;
    assert_eq!(executor.breaker().current_state(), CircuitState::HalfOpen);

    // A failure from an earlier call lands while the first probe is in flight.
    executor.breaker().on_failure();
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(executor.breaker().admit().is_probe());

    stale.abort();
    assert!(stale.await.unwrap_err().is_cancelled());

    let error = executor.run(|| async { Ok::<_, Failure>(()) }).await.unwrap_err();
    assert!(matches!(error, Error::CircuitOpen { retry_after } if retry_after.is_zero()));
}

#[test]
fn first_attempt_needs_no_tokio_runtime() {
    let executor = Executor::new(&Diagnostics::default());

    let value = futures::executor::block_on(executor.run(|| async { Ok::<_, Failure>(7) })).unwrap();

    assert_eq!(value, 7);
}

#[test]
#[should_panic(expected = "Tokio 1.x runtime")]
fn backoff_wait_needs_tokio_runtime() {
    let executor = Executor::builder(&Diagnostics::default())
        .retry_config(RetryConfig::builder().max_retries(1).build().unwrap())
        .build();

    let _ = futures::executor::block_on(executor.run(|| async { Err::<(), _>(Failure::status(503)) }));
}
