#![forbid(unsafe_code)]

//! Platform-independent half of the JS binding.
//!
//! Everything that can be expressed without `wasm-bindgen` types lives here,
//! so native tests can drive it with the simulated host: config parsing, the
//! mapping from JS numbers to handles, promise-rejection classification, and
//! JSON rendering of status and journal.

use gridspin_core::Size;
use gridspin_runtime::{
    AnimatorConfig, FrameId, GridAnimator, Host, MAX_TIMER_DELAY_MS, TimerId, TransitionId,
    TransitionOutcome,
};
use tracing::debug;
use web_time::Duration;

/// `DOMException.name` of a cancelled animation's `finished` promise.
const ABORT_ERROR: &str = "AbortError";

/// Owns the animator and translates JS-shaped calls into its entry points.
pub(crate) struct RotatorCore<H: Host> {
    animator: GridAnimator<H>,
}

impl<H: Host> RotatorCore<H> {
    /// Build from an optional JSON config. Missing fields take defaults.
    pub(crate) fn new(host: H, config_json: Option<&str>) -> Result<Self, String> {
        let config = match config_json {
            Some(json) if !json.trim().is_empty() => {
                AnimatorConfig::from_json_str(json).map_err(|e| e.to_string())?
            }
            _ => AnimatorConfig::default(),
        };
        let animator = GridAnimator::new(host, config).map_err(|e| e.to_string())?;
        debug!(icons = animator.icon_count(), "rotator created");
        Ok(Self { animator })
    }

    pub(crate) fn start(&mut self) {
        self.animator.start();
    }

    pub(crate) fn observe_size(&mut self, width: f64, height: f64) {
        self.animator
            .on_container_resized(Size::new(width, height));
    }

    pub(crate) fn window_resized(&mut self) {
        self.animator.on_window_resize();
    }

    pub(crate) fn timer_fired(&mut self, id: f64) {
        if let Some(id) = handle_from_js(id) {
            self.animator.on_timer(TimerId(id));
        }
    }

    pub(crate) fn frame(&mut self, id: f64) {
        if let Some(id) = handle_from_js(id) {
            self.animator.on_frame(FrameId(id));
        }
    }

    pub(crate) fn transition_finished(&mut self, id: f64) {
        if let Some(id) = handle_from_js(id) {
            self.animator
                .on_transition_settled(TransitionId(id), TransitionOutcome::Finished);
        }
    }

    pub(crate) fn transition_rejected(&mut self, id: f64, name: &str, message: &str) {
        if let Some(id) = handle_from_js(id) {
            self.animator
                .on_transition_settled(TransitionId(id), classify_rejection(name, message));
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.animator.offset()
    }

    pub(crate) fn status_json(&self) -> String {
        serde_json::to_string(&self.animator.status()).unwrap_or_else(|_| "{}".to_string())
    }

    pub(crate) fn drain_journal_jsonl(&mut self, run_id: &str) -> Vec<String> {
        self.animator.journal_mut().drain_jsonl(run_id)
    }

    #[cfg(test)]
    pub(crate) fn animator(&self) -> &GridAnimator<H> {
        &self.animator
    }

    #[cfg(test)]
    pub(crate) fn host_mut(&mut self) -> &mut H {
        self.animator.host_mut()
    }
}

/// Handles travel through JS as numbers. Anything that is not a non-negative
/// integer cannot be one of ours.
pub(crate) fn handle_from_js(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

/// Handle as a JS number. Handles are small sequential integers, well inside
/// the exactly-representable range.
pub(crate) fn handle_to_js(value: u64) -> f64 {
    value as f64
}

/// Stand-in handle for a host call that threw. Never matches a real callback.
pub(crate) const NO_HANDLE: u64 = u64::MAX;

/// Timer delay in JS milliseconds, clamped to what `setTimeout` honours.
pub(crate) fn timer_delay_to_js(delay: Duration) -> f64 {
    (delay.as_secs_f64() * 1000.0).min(MAX_TIMER_DELAY_MS as f64)
}

/// Map a rejected `Animation.finished` promise to an outcome.
pub(crate) fn classify_rejection(name: &str, message: &str) -> TransitionOutcome {
    if name == ABORT_ERROR {
        TransitionOutcome::Aborted
    } else if message.is_empty() {
        TransitionOutcome::Failed(name.to_string())
    } else {
        TransitionOutcome::Failed(format!("{name}: {message}"))
    }
}
