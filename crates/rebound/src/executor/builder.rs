// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use super::{Executor, Shared};
use crate::breaker::CircuitBreaker;
use crate::{BreakerConfig, Diagnostics, RandomSource, RetryConfig};

#[derive(Debug)]
enum BreakerSource {
    Owned(BreakerConfig),
    Shared(Arc<CircuitBreaker>),
}

/// Builder for [`Executor`].
///
/// Unless configured otherwise the executor uses [`RetryConfig::default`], a
/// new breaker with [`BreakerConfig::default`] and the thread-local random
/// source.
#[derive(Debug)]
#[must_use]
pub struct ExecutorBuilder {
    diagnostics: Diagnostics,
    retry: RetryConfig,
    breaker: BreakerSource,
    rnd: RandomSource,
}

impl ExecutorBuilder {
    pub(super) fn new(diagnostics: &Diagnostics) -> Self {
        Self {
            diagnostics: diagnostics.clone(),
            retry: RetryConfig::default(),
            breaker: BreakerSource::Owned(BreakerConfig::default()),
            rnd: RandomSource::default(),
        }
    }

    /// Sets the retry configuration used by [`Executor::run`].
    pub fn retry_config(self, retry: RetryConfig) -> Self {
        Self { retry, ..self }
    }

    /// Creates a dedicated breaker with `config`.
    pub fn breaker_config(self, config: BreakerConfig) -> Self {
        Self {
            breaker: BreakerSource::Owned(config),
            ..self
        }
    }

    /// Uses an existing breaker, typically shared by all executors of a client.
    pub fn breaker(self, breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            breaker: BreakerSource::Shared(breaker),
            ..self
        }
    }

    /// Replaces the source of jitter.
    pub fn random_source(self, rnd: RandomSource) -> Self {
        Self { rnd, ..self }
    }

    /// Creates the executor.
    #[must_use]
    pub fn build(self) -> Executor {
        let breaker = match self.breaker {
            BreakerSource::Owned(config) => Arc::new(CircuitBreaker::new(config, &self.diagnostics)),
            BreakerSource::Shared(breaker) => breaker,
        };

        Executor {
            shared: Arc::new(Shared {
                breaker,
                retry: self.retry,
                rnd: self.rnd,
                emitter: self.diagnostics.emitter(),
            }),
        }
    }
}
