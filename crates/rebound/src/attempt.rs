// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;
use std::time::Duration;

/// A single invocation of the operation within one execution.
///
/// Attempts are created by the executor and only escape it as copies carried
/// by diagnostics events. The first attempt has index 0 and no preceding delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attempt {
    index: u32,
    is_last: bool,
    delay_before: Duration,
}

impl Attempt {
    pub(crate) const fn first(max_retries: u32) -> Self {
        Self {
            index: 0,
            is_last: max_retries == 0,
            delay_before: Duration::ZERO,
        }
    }

    /// Returns the attempt that follows this one after waiting `delay`.
    ///
    /// Callers check [`is_last`][Self::is_last] first; the index saturates.
    pub(crate) const fn next(self, max_retries: u32, delay: Duration) -> Self {
        let index = self.index.saturating_add(1);

        Self {
            index,
            is_last: index >= max_retries,
            delay_before: delay,
        }
    }

    /// Zero-based index of this attempt.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Number of attempts made once this one completes.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.index.saturating_add(1)
    }

    /// Returns `true` for the initial call.
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Returns `true` when no retry follows this attempt.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.is_last
    }

    /// Backoff that was waited before this attempt started.
    #[must_use]
    pub const fn delay_before(&self) -> Duration {
        self.delay_before
    }
}

impl Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.index)
    }
}
