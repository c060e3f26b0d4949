// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// What went wrong during a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FailureKind {
    /// No response was obtained: connection refused, DNS failure, transport timeout.
    Network,
    /// The upstream answered with a non-success status code.
    Status(u16),
    /// A client-side failure such as a malformed request or a programming error.
    Other,
}

/// Server guidance on when to try again, typically taken from `Retry-After`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryHint {
    /// A relative delay in seconds.
    Seconds(f64),
    /// An absolute point in time.
    At(SystemTime),
}

impl RetryHint {
    /// Parses a delta-seconds value such as `"2"` or `"1.5"`.
    ///
    /// Returns `None` for anything that is not a finite, non-negative number,
    /// in which case the computed backoff is used instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use rebound::RetryHint;
    ///
    /// assert_eq!(RetryHint::parse("2"), Some(RetryHint::Seconds(2.0)));
    /// assert_eq!(RetryHint::parse("-1"), None);
    /// assert_eq!(RetryHint::parse("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let seconds: f64 = value.trim().parse().ok()?;
        (seconds.is_finite() && seconds >= 0.0).then_some(Self::Seconds(seconds))
    }

    /// Resolves the hint into a delay relative to `now`.
    ///
    /// An absolute time in the past and a negative or non-finite number of
    /// seconds resolve to `None`.
    #[must_use]
    pub fn resolve(&self, now: SystemTime) -> Option<Duration> {
        match *self {
            Self::Seconds(seconds) if seconds.is_finite() && seconds >= 0.0 => {
                Some(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
            }
            Self::Seconds(_) => None,
            Self::At(at) => at.duration_since(now).ok(),
        }
    }
}

/// Describes the failure of one attempt, as reported by the operation.
///
/// # Examples
///
/// ```
/// use rebound::{Failure, FailureKind, RetryHint};
///
/// let failure = Failure::status(503)
///     .retry_after(RetryHint::Seconds(2.0))
///     .with_message("upstream overloaded");
///
/// assert_eq!(failure.kind(), FailureKind::Status(503));
/// assert_eq!(failure.status_code(), Some(503));
/// ```
#[derive(Debug, Clone)]
pub struct Failure {
    kind: FailureKind,
    hint: Option<RetryHint>,
    message: Option<Cow<'static, str>>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Failure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub const fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            hint: None,
            message: None,
            source: None,
        }
    }

    /// A failure where no response was obtained.
    #[must_use]
    pub const fn network() -> Self {
        Self::new(FailureKind::Network)
    }

    /// A failure carrying the upstream status code.
    #[must_use]
    pub const fn status(code: u16) -> Self {
        Self::new(FailureKind::Status(code))
    }

    /// A client-side failure with a description.
    #[must_use]
    pub fn other(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(FailureKind::Other).with_message(message)
    }

    /// Attaches server guidance on when to retry.
    #[must_use]
    pub fn retry_after(mut self, hint: RetryHint) -> Self {
        self.hint = Some(hint);
        self
    }

    /// Attaches a human-readable description.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// The kind of failure.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// The upstream status code, if a response was obtained.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self.kind {
            FailureKind::Status(code) => Some(code),
            _ => None,
        }
    }

    /// Returns `true` when no response was obtained.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self.kind, FailureKind::Network)
    }

    /// The server retry hint, if any.
    #[must_use]
    pub const fn retry_hint(&self) -> Option<RetryHint> {
        self.hint
    }

    /// The description, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

#[cfg(any(feature = "http", test))]
static HTTP_DATE_PARSER: jiff::fmt::rfc2822::DateTimeParser = jiff::fmt::rfc2822::DateTimeParser::new();

#[cfg(any(feature = "http", test))]
impl RetryHint {
    /// Parses a `Retry-After` header value in either of its forms:
    /// delta-seconds (`"120"`) or an HTTP-date (`"Wed, 21 Oct 2015 07:28:00 GMT"`).
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "http")]
    /// # {
    /// use std::time::{Duration, SystemTime};
    ///
    /// use rebound::RetryHint;
    ///
    /// assert_eq!(RetryHint::parse_header("2"), Some(RetryHint::Seconds(2.0)));
    /// assert_eq!(
    ///     RetryHint::parse_header("Thu, 01 Jan 1970 00:00:10 GMT"),
    ///     Some(RetryHint::At(SystemTime::UNIX_EPOCH + Duration::from_secs(10)))
    /// );
    /// assert_eq!(RetryHint::parse_header("soon"), None);
    /// # }
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "http")))]
    #[must_use]
    pub fn parse_header(value: &str) -> Option<Self> {
        Self::parse(value).or_else(|| {
            HTTP_DATE_PARSER
                .parse_timestamp(value.trim())
                .ok()
                .map(|timestamp| Self::At(timestamp.into()))
        })
    }
}

#[cfg(any(feature = "http", test))]
impl Failure {
    /// Builds a status failure from an HTTP response, reading the
    /// `Retry-After` header through [`RetryHint::parse_header`].
    ///
    /// A header that is neither delta-seconds nor an HTTP-date is ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # #[cfg(feature = "http")]
    /// # {
    /// use http::{HeaderMap, HeaderValue, StatusCode, header::RETRY_AFTER};
    /// use rebound::{Failure, RetryHint};
    ///
    /// let mut headers = HeaderMap::new();
    /// headers.insert(RETRY_AFTER, HeaderValue::from_static("5"));
    ///
    /// let failure = Failure::from_response_parts(StatusCode::TOO_MANY_REQUESTS, &headers);
    /// assert_eq!(failure.status_code(), Some(429));
    /// assert_eq!(failure.retry_hint(), Some(RetryHint::Seconds(5.0)));
    /// # }
    /// ```
    #[cfg_attr(docsrs, doc(cfg(feature = "http")))]
    #[must_use]
    pub fn from_response_parts(status: http::StatusCode, headers: &http::HeaderMap) -> Self {
        let failure = Self::status(status.as_u16());
        let hint = headers
            .get(http::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(RetryHint::parse_header);

        match hint {
            Some(hint) => failure.retry_after(hint),
            None => failure,
        }
    }
}
