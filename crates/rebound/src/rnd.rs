// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

crate::utils::define_fn_wrapper!(pub(crate) NextF64(Fn() -> f64));

/// Source of the uniform random numbers used to jitter retry delays.
///
/// Every draw is expected to be in `[0, 1)`. The default source uses the
/// thread-local `fastrand` generator. Tests and simulations can swap it for a
/// fixed value, a seeded generator or an arbitrary function to make delays
/// reproducible.
///
/// # Examples
///
/// ```
/// use rebound::RandomSource;
///
/// let fixed = RandomSource::fixed(0.5);
/// let seeded = RandomSource::seeded(42);
/// let custom = RandomSource::from_fn(|| 0.25);
/// # let _ = (fixed, seeded, custom);
/// ```
#[derive(Clone, Default)]
pub struct RandomSource(Inner);

#[derive(Clone, Default)]
enum Inner {
    #[default]
    Thread,
    Seeded(Arc<Mutex<fastrand::Rng>>),
    Function(NextF64),
}

impl RandomSource {
    /// Draws from the thread-local `fastrand` generator.
    #[must_use]
    pub fn thread() -> Self {
        Self(Inner::Thread)
    }

    /// Always returns `value`.
    #[must_use]
    pub fn fixed(value: f64) -> Self {
        Self::from_fn(move || value)
    }

    /// Draws from a deterministic generator initialized with `seed`.
    ///
    /// Clones share the generator, so the sequence is consumed jointly.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(Inner::Seeded(Arc::new(Mutex::new(fastrand::Rng::with_seed(seed)))))
    }

    /// Draws by calling `f`.
    #[must_use]
    pub fn from_fn(f: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        Self(Inner::Function(NextF64::new(f)))
    }

    pub(crate) fn next_f64(&self) -> f64 {
        match &self.0 {
            Inner::Thread => fastrand::f64(),
            Inner::Seeded(rng) => rng.lock().unwrap_or_else(PoisonError::into_inner).f64(),
            Inner::Function(f) => f.call(),
        }
    }
}

impl Debug for RandomSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.0 {
            Inner::Thread => "Thread",
            Inner::Seeded(_) => "Seeded",
            Inner::Function(_) => "Function",
        };

        f.debug_tuple("RandomSource").field(&kind).finish()
    }
}
