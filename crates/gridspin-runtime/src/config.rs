#![forbid(unsafe_code)]

//! Animator configuration.
//!
//! Every timing constant of the rotator lives in [`AnimatorConfig`], so a page
//! can tune the loop without recompiling. `AnimatorConfig::default()` is the
//! stock portfolio grid: 14 icons on one cycle, 2 s ease-in-out steps.
//!
//! # Loading
//!
//! ```toml
//! # gridspin.toml
//! step_duration_ms = 1500
//! easing = "ease-in-out"
//! path = [[7, 0, 1, 2, 3, 4, 5, 6, 13, 12, 11, 10, 9, 8]]
//!
//! [retry]
//! max_retries = 4
//! backoff = { kind = "fixed", delay_ms = 500 }
//! ```
//!
//! ```rust,ignore
//! let config = AnimatorConfig::from_toml_file("gridspin.toml")?; // feature "toml"
//! let config = AnimatorConfig::from_json_str(json)?;
//! ```
//!
//! Missing fields take their default value.

use std::path::Path;

use gridspin_core::{Easing, PermutationError, PermutationMap, Slot};
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::host::MAX_TIMER_DELAY_MS;
use crate::retry::RetryPolicy;

/// Tunable parameters of the rotator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// How long each simultaneous move takes.
    pub step_duration_ms: u64,
    /// Timing curve of each move.
    pub easing: Easing,
    /// Icons that would move less than this on both axes are not animated.
    pub movement_threshold: f64,
    /// Pause between the first successful capture and the first step.
    pub initial_settle_ms: u64,
    /// Pause between a post-resize capture and the restarted first step.
    pub resize_settle_ms: u64,
    /// Quiet period a burst of resize events must end with.
    pub resize_debounce_ms: u64,
    /// Backoff for failed steps.
    pub retry: RetryPolicy,
    /// Number of journal entries kept before the oldest are dropped.
    pub journal_capacity: usize,
    /// Rotation path as a list of closed cycles over slot indices.
    pub path: Vec<Vec<Slot>>,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            step_duration_ms: 2_000,
            easing: Easing::EaseInOut,
            movement_threshold: 1.0,
            initial_settle_ms: 100,
            resize_settle_ms: 200,
            resize_debounce_ms: 250,
            retry: RetryPolicy::default(),
            journal_capacity: 512,
            path: vec![vec![7, 0, 1, 2, 3, 4, 5, 6, 13, 12, 11, 10, 9, 8]],
        }
    }
}

impl AnimatorConfig {
    /// Set the step duration (builder pattern).
    #[must_use]
    pub fn with_step_duration(mut self, d: Duration) -> Self {
        self.step_duration_ms = duration_ms(d);
        self
    }

    /// Set the easing curve (builder pattern).
    #[must_use]
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Set the retry policy (builder pattern).
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the rotation path (builder pattern).
    #[must_use]
    pub fn with_path(mut self, cycles: Vec<Vec<Slot>>) -> Self {
        self.path = cycles;
        self
    }

    /// Set the resize debounce quiet period (builder pattern).
    #[must_use]
    pub fn with_resize_debounce(mut self, d: Duration) -> Self {
        self.resize_debounce_ms = duration_ms(d);
        self
    }

    #[inline]
    pub fn step_duration(&self) -> Duration {
        Duration::from_millis(self.step_duration_ms)
    }

    #[inline]
    pub fn initial_settle(&self) -> Duration {
        Duration::from_millis(self.initial_settle_ms)
    }

    #[inline]
    pub fn resize_settle(&self) -> Duration {
        Duration::from_millis(self.resize_settle_ms)
    }

    #[inline]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Build the permutation map described by `path`.
    pub fn permutation_map(&self) -> Result<PermutationMap, PermutationError> {
        PermutationMap::from_cycles(&self.path)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load from a TOML string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.step_duration_ms == 0 {
            errors.push("step_duration_ms must be > 0".into());
        }

        if !self.movement_threshold.is_finite() || self.movement_threshold < 0.0 {
            errors.push(format!(
                "movement_threshold must be finite and >= 0, got {}",
                self.movement_threshold
            ));
        }

        for (name, ms) in [
            ("initial_settle_ms", self.initial_settle_ms),
            ("resize_settle_ms", self.resize_settle_ms),
            ("resize_debounce_ms", self.resize_debounce_ms),
        ] {
            if ms > MAX_TIMER_DELAY_MS {
                errors.push(format!("{name} must be <= {MAX_TIMER_DELAY_MS}, got {ms}"));
            }
        }

        if self.journal_capacity == 0 {
            errors.push("journal_capacity must be > 0".into());
        }

        self.retry.validate(&mut errors);

        if let Err(e) = self.permutation_map() {
            errors.push(format!("path: {e}"));
        }

        errors
    }

    /// Like [`validate`](Self::validate), but as a `Result`.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Errors from loading an [`AnimatorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),
    /// TOML parse error.
    #[cfg(feature = "toml")]
    #[error("TOML parse error: {0}")]
    Toml(#[source] toml::de::Error),
    /// Validation errors.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
