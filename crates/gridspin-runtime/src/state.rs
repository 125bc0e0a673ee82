#![forbid(unsafe_code)]

//! The animator's mutable state, in one place.

use ahash::AHashMap;
use gridspin_core::Slot;

use crate::host::{FrameId, TimerId, TransitionId};
use crate::oracle::SlotPositions;
use crate::scheduler::{SchedulerPhase, StepToken};

/// What a pending timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerPurpose {
    /// Pause after the first capture before the first step.
    InitialSettle,
    /// Pause after a post-resize capture before the first step.
    ResizeSettle,
    /// Backoff before re-running a failed step.
    RetryBackoff,
    /// Quiet period of the resize debounce.
    ResizeDebounce,
}

/// Progress of the one-shot readiness trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// `start()` has not asked the host to observe the container yet.
    Unobserved,
    /// Waiting for a non-zero container size with usable geometry.
    Waiting,
    /// Fired; later size notifications are ignored.
    Ready,
}

/// The step currently animating.
#[derive(Debug)]
pub(crate) struct InFlightStep {
    pub token: StepToken,
    pub offset: usize,
    /// Transitions that have not settled yet, and the icon each one moves.
    pub pending: AHashMap<TransitionId, Slot>,
}

#[derive(Debug)]
pub(crate) struct AnimatorState {
    pub phase: SchedulerPhase,
    /// Path-steps applied since the layout epoch began, in `[0, N)`.
    pub offset: usize,
    /// Whether the loop may schedule or run steps.
    pub eligible: bool,
    pub readiness: Readiness,
    pub resize_listener_attached: bool,
    pub epoch: u64,
    pub positions: Option<SlotPositions>,
    /// Incremented for every step started.
    pub generation: u64,
    pub in_flight: Option<InFlightStep>,
    pub pending_frame: Option<FrameId>,
    pub timers: AHashMap<TimerId, TimerPurpose>,
    /// Consecutive failed attempts of the current offset.
    pub retry_attempt: u32,
}

impl AnimatorState {
    pub fn new() -> Self {
        Self {
            phase: SchedulerPhase::Idle,
            offset: 0,
            eligible: false,
            readiness: Readiness::Unobserved,
            resize_listener_attached: false,
            epoch: 0,
            positions: None,
            generation: 0,
            in_flight: None,
            pending_frame: None,
            timers: AHashMap::new(),
            retry_attempt: 0,
        }
    }
}
