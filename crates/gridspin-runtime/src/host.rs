#![forbid(unsafe_code)]

//! Host abstraction: everything the animator needs from its environment.
//!
//! In the browser the host wraps the grid container, `Element.animate`,
//! `requestAnimationFrame`, and `setTimeout`. In tests it is the virtual-clock
//! simulator from `gridspin-harness`. All asynchronous completions flow back
//! through [`GridAnimator`](crate::GridAnimator) entry points:
//!
//! | Host call | Completion delivered via |
//! |-----------|--------------------------|
//! | [`Host::animate`] | `on_transition_settled(id, outcome)` |
//! | [`Host::request_frame`] | `on_frame(id)` |
//! | [`Host::set_timer`] | `on_timer(id)` |
//! | [`Host::observe_container`] | `on_container_resized(size)` |
//! | [`Host::attach_resize_listener`] | `on_window_resize()` |
//!
//! Hosts must not call back into the animator synchronously from inside one
//! of these methods.
//!
//! Timer delays never exceed [`MAX_TIMER_DELAY_MS`]; config validation
//! rejects anything longer.

use std::fmt;

use gridspin_core::{Position, Slot, TransitionSpec};
use web_time::Duration;

/// Longest delay a browser `setTimeout` honours. Larger values wrap to an
/// immediate callback.
pub const MAX_TIMER_DELAY_MS: u64 = i32::MAX as u64;

/// Handle to one running transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u64);

/// Handle to one pending frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Handle to one pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transition#{}", self.0)
    }
}

/// A host operation failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    /// Wrap a host-specific message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The host's description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// How a transition ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Ran to completion.
    Finished,
    /// Cancelled on purpose (the DOM reports an `AbortError`).
    Aborted,
    /// Any other failure.
    Failed(String),
}

/// The environment the animator drives.
pub trait Host {
    /// Number of icon elements in the grid. Read once at construction.
    fn icon_count(&self) -> usize;

    /// Natural layout position of `icon` with no offset applied.
    fn layout_position(&mut self, icon: Slot) -> Result<Position, HostError>;

    /// Remove any residual visual offset from `icon`.
    fn clear_offset(&mut self, icon: Slot) -> Result<(), HostError>;

    /// Start a transition. It must not persist its final keyframe.
    fn animate(&mut self, spec: &TransitionSpec) -> Result<TransitionId, HostError>;

    /// Cancel every active transition on `icon`. Cancelled transitions settle
    /// as [`TransitionOutcome::Aborted`].
    fn cancel_transitions(&mut self, icon: Slot) -> Result<(), HostError>;

    /// Ask for `on_frame` before the next paint.
    fn request_frame(&mut self) -> FrameId;

    /// Withdraw a frame request. Unknown ids are ignored.
    fn cancel_frame(&mut self, id: FrameId);

    /// Ask for `on_timer` after `delay`.
    fn set_timer(&mut self, delay: Duration) -> TimerId;

    /// Withdraw a timer. Unknown ids are ignored.
    fn clear_timer(&mut self, id: TimerId);

    /// Start reporting the container's size through `on_container_resized`.
    fn observe_container(&mut self) -> Result<(), HostError>;

    /// Stop reporting the container's size.
    fn unobserve_container(&mut self);

    /// Start forwarding window resize events through `on_window_resize`.
    fn attach_resize_listener(&mut self) -> Result<(), HostError>;
}

impl<H: Host + ?Sized> Host for &mut H {
    fn icon_count(&self) -> usize {
        (**self).icon_count()
    }

    fn layout_position(&mut self, icon: Slot) -> Result<Position, HostError> {
        (**self).layout_position(icon)
    }

    fn clear_offset(&mut self, icon: Slot) -> Result<(), HostError> {
        (**self).clear_offset(icon)
    }

    fn animate(&mut self, spec: &TransitionSpec) -> Result<TransitionId, HostError> {
        (**self).animate(spec)
    }

    fn cancel_transitions(&mut self, icon: Slot) -> Result<(), HostError> {
        (**self).cancel_transitions(icon)
    }

    fn request_frame(&mut self) -> FrameId {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, id: FrameId) {
        (**self).cancel_frame(id);
    }

    fn set_timer(&mut self, delay: Duration) -> TimerId {
        (**self).set_timer(delay)
    }

    fn clear_timer(&mut self, id: TimerId) {
        (**self).clear_timer(id);
    }

    fn observe_container(&mut self) -> Result<(), HostError> {
        (**self).observe_container()
    }

    fn unobserve_container(&mut self) {
        (**self).unobserve_container();
    }

    fn attach_resize_listener(&mut self) -> Result<(), HostError> {
        (**self).attach_resize_listener()
    }
}
