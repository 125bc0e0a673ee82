#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the grid rotator.
//!
//! This module wraps [`super::rotator_core::RotatorCore`] with JS-friendly
//! types. Only compiled on `wasm32` targets.

use gridspin_core::{Position, Slot, TransitionSpec};
use gridspin_runtime::{FrameId, Host, HostError, TimerId, TransitionId};
use js_sys::{Array, Reflect};
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_time::Duration;

use super::rotator_core::{
    NO_HANDLE, RotatorCore, handle_from_js, handle_to_js, timer_delay_to_js,
};

#[wasm_bindgen]
extern "C" {
    /// The page-side object that owns the DOM work.
    pub type GridHost;

    #[wasm_bindgen(method, catch, js_name = iconCount)]
    fn icon_count(this: &GridHost) -> Result<u32, JsValue>;

    /// `[left, top]` of the icon with no transform applied.
    #[wasm_bindgen(method, catch, js_name = layoutPosition)]
    fn layout_position(this: &GridHost, icon: u32) -> Result<Vec<f64>, JsValue>;

    #[wasm_bindgen(method, catch, js_name = clearOffset)]
    fn clear_offset(this: &GridHost, icon: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn animate(
        this: &GridHost,
        icon: u32,
        from: &str,
        to: &str,
        duration_ms: f64,
        easing: &str,
    ) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = cancelTransitions)]
    fn cancel_transitions(this: &GridHost, icon: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = requestFrame)]
    fn request_frame(this: &GridHost) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = cancelFrame)]
    fn cancel_frame(this: &GridHost, id: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setTimer)]
    fn set_timer(this: &GridHost, delay_ms: f64) -> Result<f64, JsValue>;

    #[wasm_bindgen(method, catch, js_name = clearTimer)]
    fn clear_timer(this: &GridHost, id: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = observeContainer)]
    fn observe_container(this: &GridHost) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = unobserveContainer)]
    fn unobserve_container(this: &GridHost) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = attachResizeListener)]
    fn attach_resize_listener(this: &GridHost) -> Result<(), JsValue>;
}

/// Render a thrown JS value as a host error.
fn host_error(value: &JsValue) -> HostError {
    if let Some(s) = value.as_string() {
        return HostError::new(s);
    }
    let field = |key: &str| {
        Reflect::get(value, &JsValue::from_str(key))
            .ok()
            .and_then(|v| v.as_string())
    };
    match (field("name"), field("message")) {
        (Some(name), Some(message)) => HostError::new(format!("{name}: {message}")),
        (None, Some(message)) => HostError::new(message),
        (Some(name), None) => HostError::new(name),
        (None, None) => HostError::new("unknown JS exception"),
    }
}

fn icon_index(icon: Slot) -> u32 {
    u32::try_from(icon).unwrap_or(u32::MAX)
}

/// Log a throw from a host method that has no error channel.
fn swallow(call: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        warn!(call, error = %host_error(&e), "GridHost method threw");
    }
}

/// Handle returned by a host method, or [`NO_HANDLE`] if it threw or returned
/// something that is not a handle. No callback ever arrives for `NO_HANDLE`.
fn handle_or_none(call: &str, result: Result<f64, JsValue>) -> u64 {
    match result {
        Ok(id) => handle_from_js(id).unwrap_or_else(|| {
            warn!(call, id, "GridHost returned an invalid handle");
            NO_HANDLE
        }),
        Err(e) => {
            warn!(call, error = %host_error(&e), "GridHost method threw");
            NO_HANDLE
        }
    }
}

/// [`Host`] over a JS [`GridHost`].
struct JsHost {
    inner: GridHost,
}

impl Host for JsHost {
    fn icon_count(&self) -> usize {
        match self.inner.icon_count() {
            Ok(n) => n as usize,
            Err(e) => {
                // Reported to the caller as too few icons.
                warn!(error = %host_error(&e), "GridHost.iconCount threw");
                0
            }
        }
    }

    fn layout_position(&mut self, icon: Slot) -> Result<Position, HostError> {
        let xy = self
            .inner
            .layout_position(icon_index(icon))
            .map_err(|e| host_error(&e))?;
        match xy.as_slice() {
            [left, top] => Ok(Position::new(*left, *top)),
            other => Err(HostError::new(format!(
                "layoutPosition returned {} values, expected 2",
                other.len()
            ))),
        }
    }

    fn clear_offset(&mut self, icon: Slot) -> Result<(), HostError> {
        self.inner
            .clear_offset(icon_index(icon))
            .map_err(|e| host_error(&e))
    }

    fn animate(&mut self, spec: &TransitionSpec) -> Result<TransitionId, HostError> {
        let [from, to] = spec.css_keyframes();
        let id = self
            .inner
            .animate(
                icon_index(spec.icon),
                &from,
                &to,
                spec.duration_ms(),
                spec.easing.css_name(),
            )
            .map_err(|e| host_error(&e))?;
        handle_from_js(id)
            .map(TransitionId)
            .ok_or_else(|| HostError::new(format!("animate returned invalid handle {id}")))
    }

    fn cancel_transitions(&mut self, icon: Slot) -> Result<(), HostError> {
        self.inner
            .cancel_transitions(icon_index(icon))
            .map_err(|e| host_error(&e))
    }

    fn request_frame(&mut self) -> FrameId {
        FrameId(handle_or_none("requestFrame", self.inner.request_frame()))
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if id.0 != NO_HANDLE {
            swallow("cancelFrame", self.inner.cancel_frame(handle_to_js(id.0)));
        }
    }

    fn set_timer(&mut self, delay: Duration) -> TimerId {
        let result = self.inner.set_timer(timer_delay_to_js(delay));
        TimerId(handle_or_none("setTimer", result))
    }

    fn clear_timer(&mut self, id: TimerId) {
        if id.0 != NO_HANDLE {
            swallow("clearTimer", self.inner.clear_timer(handle_to_js(id.0)));
        }
    }

    fn observe_container(&mut self) -> Result<(), HostError> {
        self.inner.observe_container().map_err(|e| host_error(&e))
    }

    fn unobserve_container(&mut self) {
        swallow("unobserveContainer", self.inner.unobserve_container());
    }

    fn attach_resize_listener(&mut self) -> Result<(), HostError> {
        self.inner
            .attach_resize_listener()
            .map_err(|e| host_error(&e))
    }
}

/// Grid icon rotator driven from JavaScript.
#[wasm_bindgen]
pub struct GridRotator {
    core: RotatorCore<JsHost>,
}

#[wasm_bindgen]
impl GridRotator {
    /// Create a rotator over `host`'s icons. `config` is an optional JSON
    /// object; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(host: GridHost, config: Option<String>) -> Result<GridRotator, JsValue> {
        let core = RotatorCore::new(JsHost { inner: host }, config.as_deref())
            .map_err(|e| JsValue::from_str(&e))?;
        Ok(Self { core })
    }

    /// Begin observing the container. A failure disables the rotator; it is
    /// reported through the journal, not thrown.
    pub fn start(&mut self) {
        self.core.start();
    }

    /// Forward a `ResizeObserver` entry's content size.
    #[wasm_bindgen(js_name = observeSize)]
    pub fn observe_size(&mut self, width: f64, height: f64) {
        self.core.observe_size(width, height);
    }

    /// Forward a window `resize` event.
    #[wasm_bindgen(js_name = windowResized)]
    pub fn window_resized(&mut self) {
        self.core.window_resized();
    }

    #[wasm_bindgen(js_name = timerFired)]
    pub fn timer_fired(&mut self, id: f64) {
        self.core.timer_fired(id);
    }

    pub fn frame(&mut self, id: f64) {
        self.core.frame(id);
    }

    /// `Animation.finished` resolved.
    #[wasm_bindgen(js_name = transitionFinished)]
    pub fn transition_finished(&mut self, id: f64) {
        self.core.transition_finished(id);
    }

    /// `Animation.finished` rejected with an error of `name`.
    #[wasm_bindgen(js_name = transitionRejected)]
    pub fn transition_rejected(&mut self, id: f64, name: String, message: String) {
        self.core.transition_rejected(id, &name, &message);
    }

    pub fn offset(&self) -> u32 {
        u32::try_from(self.core.offset()).unwrap_or(u32::MAX)
    }

    /// Animator status as a JSON string.
    pub fn status(&self) -> String {
        self.core.status_json()
    }

    /// Drain the lifecycle journal as JSON lines.
    #[wasm_bindgen(js_name = drainJournalJsonl)]
    pub fn drain_journal_jsonl(&mut self, run_id: String) -> Array {
        let out = Array::new();
        for line in self.core.drain_journal_jsonl(&run_id) {
            out.push(&JsValue::from_str(&line));
        }
        out
    }
}
