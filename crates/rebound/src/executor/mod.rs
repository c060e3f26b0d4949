// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Executing calls with retries behind a circuit breaker.
//!
//! [`Executor::run`] performs one logical request:
//!
//! 1. The breaker is asked for admission. A rejection ends the execution with
//!    [`Error::CircuitOpen`] before the operation is invoked.
//! 2. The operation is invoked. Success is reported to the breaker and the
//!    value returned.
//! 3. A failure is reported to the breaker and classified. Non-retryable
//!    failures end the execution with [`Error::NonRetryableFailure`]; when the
//!    retry budget is spent it ends with [`Error::RetriesExhausted`].
//! 4. Otherwise the executor waits for the [backoff][crate::backoff] delay, or
//!    the server hint, and goes back to step 2.
//!
//! Attempts within one execution are strictly sequential. Any number of
//! executions may run concurrently on clones of the same executor.

mod builder;
mod probe;

use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

pub use builder::ExecutorBuilder;
use probe::ProbeGuard;

use crate::breaker::{Admission, CircuitBreaker};
use crate::classify::classify;
use crate::diagnostics::Emitter;
use crate::{Attempt, Classification, Diagnostics, Error, Event, Failure, RandomSource, RetryConfig, backoff};

/// Runs operations against one upstream with retries and circuit breaking.
///
/// Cloning is cheap; clones share the breaker and configuration.
///
/// # Examples
///
/// ```
/// use rebound::{Diagnostics, Executor, Failure};
///
/// # async fn fetch(id: u32) -> Result<String, Failure> { Ok(format!("item {id}")) }
/// # async fn example() -> Result<(), rebound::Error> {
/// let executor = Executor::new(&Diagnostics::new("inventory"));
///
/// let item = executor.run(|| fetch(42)).await?;
/// # let _ = item;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Executor {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    rnd: RandomSource,
    emitter: Emitter,
}

impl Executor {
    /// Creates an executor with default retry and breaker settings.
    #[must_use]
    pub fn new(diagnostics: &Diagnostics) -> Self {
        Self::builder(diagnostics).build()
    }

    /// Starts building a customized executor.
    pub fn builder(diagnostics: &Diagnostics) -> ExecutorBuilder {
        ExecutorBuilder::new(diagnostics)
    }

    /// The breaker guarding the upstream.
    #[must_use]
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.shared.breaker
    }

    /// The retry configuration used by [`run`][Self::run].
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.shared.retry
    }

    /// Runs `operation` until it succeeds, fails permanently or the retry
    /// budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CircuitOpen`], [`Error::NonRetryableFailure`] or
    /// [`Error::RetriesExhausted`].
    ///
    /// # Panics
    ///
    /// Backoff waits use Tokio timers. Polling the returned future outside a
    /// Tokio runtime with the `time` driver enabled panics once the first
    /// retry is scheduled.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.execute(&self.shared.retry, operation, std::future::pending()).await
    }

    /// Like [`run`][Self::run] with a per-call retry configuration.
    ///
    /// # Errors
    ///
    /// Same as [`run`][Self::run].
    ///
    /// # Panics
    ///
    /// Same as [`run`][Self::run].
    pub async fn run_with<T, F, Fut>(&self, config: &RetryConfig, operation: F) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.execute(config, operation, std::future::pending()).await
    }

    /// Like [`run`][Self::run], but stops as soon as `signal` completes.
    ///
    /// Cancellation aborts an in-flight attempt or backoff wait. It is not
    /// reported to the breaker as a failure, and a single-probe claim held by
    /// this execution is released.
    ///
    /// # Errors
    ///
    /// Same as [`run`][Self::run], plus [`Error::Cancelled`].
    ///
    /// # Panics
    ///
    /// Same as [`run`][Self::run].
    pub async fn run_until<T, F, Fut, S>(&self, operation: F, signal: S) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
        S: Future<Output = ()>,
    {
        self.execute(&self.shared.retry, operation, signal).await
    }

    /// Like [`run_until`][Self::run_until] with a deadline for the whole
    /// execution, including backoff waits.
    ///
    /// # Errors
    ///
    /// Same as [`run_until`][Self::run_until].
    ///
    /// # Panics
    ///
    /// Panics on the first poll when not running inside a Tokio runtime with
    /// the `time` driver enabled.
    pub async fn run_with_timeout<T, F, Fut>(&self, operation: F, timeout: Duration) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
    {
        self.run_until(operation, tokio::time::sleep(timeout)).await
    }

    /// Like [`run`][Self::run], but lets `fallback` supply a value when the
    /// upstream is unavailable.
    ///
    /// `fallback` is consulted only for errors where
    /// [`Error::is_unavailable`] holds. Returning `None` propagates the error.
    ///
    /// # Errors
    ///
    /// Same as [`run`][Self::run] when no fallback value is supplied.
    pub async fn run_with_fallback<T, F, Fut, B>(&self, operation: F, fallback: B) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
        B: FnOnce(&Error) -> Option<T>,
    {
        match self.run(operation).await {
            Err(error) if error.is_unavailable() => match fallback(&error) {
                Some(value) => {
                    self.shared.emitter.emit(&Event::FallbackUsed { reason: error.as_str() });
                    Ok(value)
                }
                None => Err(error),
            },
            result => result,
        }
    }

    async fn execute<T, F, Fut, S>(&self, config: &RetryConfig, mut operation: F, signal: S) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Failure>>,
        S: Future<Output = ()>,
    {
        let breaker = &*self.shared.breaker;
        let mut probe = match breaker.admit() {
            Admission::Rejected { retry_after } => return Err(Error::CircuitOpen { retry_after }),
            Admission::Allowed { probe } => ProbeGuard::new(breaker, probe),
        };

        let mut signal = pin!(signal);
        let mut attempt = Attempt::first(config.max_retries());

        loop {
            let outcome = tokio::select! {
                biased;
                () = &mut signal => return Err(self.cancelled(attempt)),
                outcome = operation() => outcome,
            };

            let failure = match outcome {
                Ok(value) => {
                    breaker.on_success();
                    probe.disarm();
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            breaker.on_failure();
            probe.disarm();

            let classification = classify(&failure, config);

            if attempt.is_last() || !classification.is_retryable() {
                self.report_failure(attempt, config, &failure, classification, None);
                return Err(terminal_error(attempt, classification, failure));
            }

            let hint = failure.retry_hint().and_then(|hint| hint.resolve(SystemTime::now()));
            let delay = backoff::delay(attempt.index(), config, hint, &self.shared.rnd);
            self.report_failure(attempt, config, &failure, classification, Some(delay));

            tokio::select! {
                biased;
                () = &mut signal => return Err(self.cancelled(attempt)),
                () = tokio::time::sleep(delay) => {}
            }

            attempt = attempt.next(config.max_retries(), delay);
        }
    }

    fn report_failure(
        &self,
        attempt: Attempt,
        config: &RetryConfig,
        failure: &Failure,
        classification: Classification,
        delay: Option<Duration>,
    ) {
        self.shared.emitter.emit(&Event::AttemptFailed {
            attempt,
            max_retries: config.max_retries(),
            status: failure.status_code(),
            classification,
            delay,
            state: self.shared.breaker.current_state(),
        });
    }

    fn cancelled(&self, attempt: Attempt) -> Error {
        let attempts = attempt.count();
        self.shared.emitter.emit(&Event::Cancelled { attempts });
        Error::Cancelled { attempts }
    }
}

fn terminal_error(attempt: Attempt, classification: Classification, cause: Failure) -> Error {
    let attempts = attempt.count();

    match classification {
        Classification::Retryable => Error::RetriesExhausted { attempts, cause },
        Classification::NonRetryable => Error::NonRetryableFailure { attempts, cause },
    }
}
