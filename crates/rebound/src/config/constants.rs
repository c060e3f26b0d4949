// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Retries performed after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry, before jitter.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for any single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Width of the jitter band relative to the capped delay.
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// Status codes worth retrying: timeouts, throttling and transient server errors.
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Consecutive failures that open the circuit.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Time the circuit stays open before a probe is admitted.
pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
