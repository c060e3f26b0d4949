// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decides whether a failure is worth retrying.

use crate::{Failure, FailureKind, RetryConfig};

/// Whether a failure is transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The failure is transient and the call may be retried.
    Retryable,
    /// Retrying would produce the same failure.
    NonRetryable,
}

impl Classification {
    /// Stable name used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retryable => "retryable",
            Self::NonRetryable => "non_retryable",
        }
    }

    /// Returns `true` for [`Classification::Retryable`].
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Retryable)
    }
}

/// Classifies `failure` under `config`.
///
/// Network failures are always retryable, status failures are retryable when
/// the code is in [`RetryConfig::retryable_status_codes`] and anything else is
/// not.
///
/// # Examples
///
/// ```
/// use rebound::{Classification, Failure, RetryConfig, classify};
///
/// let config = RetryConfig::default();
///
/// assert_eq!(classify::classify(&Failure::network(), &config), Classification::Retryable);
/// assert_eq!(classify::classify(&Failure::status(404), &config), Classification::NonRetryable);
/// ```
#[must_use]
pub fn classify(failure: &Failure, config: &RetryConfig) -> Classification {
    let retryable = match failure.kind() {
        FailureKind::Network => true,
        FailureKind::Status(code) => config.is_retryable_status(code),
        FailureKind::Other => false,
    };

    if retryable {
        Classification::Retryable
    } else {
        Classification::NonRetryable
    }
}

/// Returns `true` if `failure` may be retried under `config`.
#[must_use]
pub fn is_retryable(failure: &Failure, config: &RetryConfig) -> bool {
    classify(failure, config).is_retryable()
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failures_are_always_retryable() {
        let config = RetryConfig::builder().retryable_status_codes([]).build().unwrap();
        assert!(is_retryable(&Failure::network(), &config));
    }

    #[test]
    fn default_status_codes() {
        let config = RetryConfig::default();

        for code in [408, 429, 500, 502, 503, 504] {
            assert!(is_retryable(&Failure::status(code), &config), "{code} should be retryable");
        }

        for code in [400, 401, 403, 404, 409, 422, 501, 505] {
            assert!(!is_retryable(&Failure::status(code), &config), "{code} should not be retryable");
        }
    }

    #[test]
    fn custom_status_codes() {
        let config = RetryConfig::builder().retryable_status_codes([409]).build().unwrap();

        assert!(is_retryable(&Failure::status(409), &config));
        assert!(!is_retryable(&Failure::status(503), &config));
    }

    #[test]
    fn other_failures_are_not_retryable() {
        assert_eq!(
            classify(&Failure::other("bad request body"), &RetryConfig::default()),
            Classification::NonRetryable
        );
    }

    #[test]
    fn as_str() {
        assert_eq!(Classification::Retryable.as_str(), "retryable");
        assert_eq!(Classification::NonRetryable.as_str(), "non_retryable");
    }
}
