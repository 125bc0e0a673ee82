// SPDX-License-Identifier: Apache-2.0
//! Retry policy for failed animation steps.
//!
//! A step fails when one of its transitions settles with an unexpected error.
//! The scheduler then waits [`RetryPolicy::delay`] and re-runs the *same*
//! offset. Retries are bounded: once [`RetryPolicy::max_retries`] consecutive
//! attempts have failed the loop stops until the next layout epoch.
//!
//! # Determinism
//!
//! Backoff delays use fixed formulas (no jitter/randomness) so that simulated
//! runs reproduce exact timing sequences.
//!
//! # Example
//!
//! ```
//! use gridspin_runtime::retry::{RetryPolicy, BackoffStrategy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(3, BackoffStrategy::Exponential {
//!     base_ms: 500,
//!     max_ms: 8000,
//! });
//!
//! assert_eq!(policy.delay(0), Duration::from_millis(500));
//! assert_eq!(policy.delay(1), Duration::from_millis(1000));
//! assert_eq!(policy.delay(2), Duration::from_millis(2000));
//! assert!(policy.should_retry(2));
//! assert!(!policy.should_retry(3));
//! ```

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::host::MAX_TIMER_DELAY_MS;

/// Backoff strategy for retry delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Fixed delay between retries.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Exponential backoff: `base_ms * 2^attempt`, capped at `max_ms`.
    Exponential {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay cap in milliseconds.
        max_ms: u64,
    },
    /// Linear backoff: `base_ms * (attempt + 1)`, capped at `max_ms`.
    Linear {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay cap in milliseconds.
        max_ms: u64,
    },
}

/// A retry policy with configurable attempts and backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of consecutive retries of one step (0 = never retry).
    pub max_retries: u32,
    /// Backoff strategy between retries.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_retries: u32, backoff: BackoffStrategy) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Never retry: the first failure stops the loop.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffStrategy::Fixed { delay_ms: 0 },
        }
    }

    /// Compute the delay before the given retry (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        match &self.backoff {
            BackoffStrategy::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            BackoffStrategy::Exponential { base_ms, max_ms } => {
                let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
                let delay = base_ms.saturating_mul(multiplier);
                Duration::from_millis(delay.min(*max_ms))
            }
            BackoffStrategy::Linear { base_ms, max_ms } => {
                let delay = base_ms.saturating_mul(u64::from(attempt) + 1);
                Duration::from_millis(delay.min(*max_ms))
            }
        }
    }

    /// True if a step that has already been retried `attempt` times may be
    /// retried again.
    #[inline]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Problems with the policy's parameters, if any.
    ///
    /// Every delay the policy can produce must fit a host timer, so the cap
    /// (or the fixed delay) is bounded by [`MAX_TIMER_DELAY_MS`].
    pub(crate) fn validate(&self, errors: &mut Vec<String>) {
        match self.backoff {
            BackoffStrategy::Exponential { base_ms, max_ms }
            | BackoffStrategy::Linear { base_ms, max_ms } => {
                if base_ms == 0 && self.max_retries > 0 {
                    errors.push("retry.backoff.base_ms must be > 0".into());
                }
                if max_ms < base_ms {
                    errors.push(format!(
                        "retry.backoff.max_ms ({max_ms}) must be >= base_ms ({base_ms})"
                    ));
                }
                if max_ms > MAX_TIMER_DELAY_MS {
                    errors.push(format!(
                        "retry.backoff.max_ms must be <= {MAX_TIMER_DELAY_MS}, got {max_ms}"
                    ));
                }
            }
            BackoffStrategy::Fixed { delay_ms } => {
                if delay_ms > MAX_TIMER_DELAY_MS {
                    errors.push(format!(
                        "retry.backoff.delay_ms must be <= {MAX_TIMER_DELAY_MS}, got {delay_ms}"
                    ));
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    /// Exponential from 500 ms, capped at 8 s, at most 8 retries.
    fn default() -> Self {
        Self::new(
            8,
            BackoffStrategy::Exponential {
                base_ms: 500,
                max_ms: 8_000,
            },
        )
    }
}
