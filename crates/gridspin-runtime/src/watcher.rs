#![forbid(unsafe_code)]

//! Layout watcher: decides when the loop may run.
//!
//! Two triggers feed it:
//!
//! - **Readiness** fires once, on the first non-zero container size whose
//!   positions capture cleanly. A size of zero, or a capture that finds
//!   degenerate geometry, leaves the watcher armed for the next notification.
//! - **Resize** is debounced: every window resize restarts a quiet-period
//!   timer, and only its expiry resets the loop.
//!
//! A resize reset ends the layout epoch. Everything belonging to the old
//! epoch (pending frame, settle and retry timers, the in-flight step and its
//! transitions) is withdrawn before new positions are captured, so nothing
//! from the old geometry can act on the new one.

use gridspin_core::Size;
use tracing::{debug, error, info, trace, warn};

use crate::animator::{GridAnimator, LOG_TARGET};
use crate::host::Host;
use crate::journal::JournalEntry;
use crate::oracle::{SlotPositions, capture_positions};
use crate::scheduler::SchedulerPhase;
use crate::state::{Readiness, TimerPurpose};

impl<H: Host> GridAnimator<H> {
    /// Wire the animator to its host.
    ///
    /// Asks the host to start observing the container. If that fails the
    /// animator is disabled for the rest of the session and ignores every
    /// later event. Calling `start` twice is a no-op.
    pub fn start(&mut self) {
        if self.state.readiness != Readiness::Unobserved
            || self.state.phase == SchedulerPhase::Disabled
        {
            return;
        }
        match self.host.observe_container() {
            Ok(()) => {
                self.state.readiness = Readiness::Waiting;
                debug!(target: LOG_TARGET, icons = self.icon_count, "observing container");
            }
            Err(e) => self.disable(format!("observing container: {e}")),
        }
    }

    /// The container's observed size changed.
    ///
    /// Only matters until readiness has fired.
    pub fn on_container_resized(&mut self, size: Size) {
        if self.state.readiness != Readiness::Waiting {
            return;
        }
        if size.is_empty() {
            trace!(
                target: LOG_TARGET,
                width = size.width,
                height = size.height,
                "container has no size yet"
            );
            return;
        }

        if !self.recapture() {
            // Stay armed; the next non-zero size tries again.
            return;
        }

        self.state.readiness = Readiness::Ready;
        self.host.unobserve_container();
        if !self.state.resize_listener_attached {
            match self.host.attach_resize_listener() {
                Ok(()) => self.state.resize_listener_attached = true,
                Err(e) => {
                    self.disable(format!("attaching resize listener: {e}"));
                    return;
                }
            }
        }

        self.state.eligible = true;
        self.state.phase = SchedulerPhase::Running;
        info!(
            target: LOG_TARGET,
            width = size.width,
            height = size.height,
            "grid ready; starting rotation"
        );
        let settle = self.config.initial_settle();
        self.schedule_timer(settle, TimerPurpose::InitialSettle);
    }

    /// The window was resized. Restarts the debounce quiet period.
    pub fn on_window_resize(&mut self) {
        if !self.state.resize_listener_attached || self.state.phase == SchedulerPhase::Disabled {
            return;
        }
        self.clear_timers(|purpose| purpose == TimerPurpose::ResizeDebounce);
        let quiet = self.config.resize_debounce();
        self.schedule_timer(quiet, TimerPurpose::ResizeDebounce);
    }

    /// Debounce expired: end the epoch and restart from offset 0.
    pub(crate) fn handle_resize(&mut self) {
        let ended_epoch = self.state.epoch;
        self.state.eligible = false;
        self.state.phase = SchedulerPhase::Stopped;

        if let Some(frame) = self.state.pending_frame.take() {
            self.host.cancel_frame(frame);
        }
        self.clear_timers(|purpose| purpose != TimerPurpose::ResizeDebounce);

        // Dropping the step first makes the aborts below settle as stale.
        self.state.in_flight = None;
        for icon in 0..self.icon_count {
            if let Err(e) = self.host.cancel_transitions(icon) {
                warn!(target: LOG_TARGET, icon, error = %e, "cancelling transitions failed");
            }
        }
        self.state.offset = 0;
        self.state.retry_attempt = 0;

        info!(target: LOG_TARGET, ended_epoch, "resize: restarting rotation from offset 0");
        self.journal.record(JournalEntry::ResizeReset { ended_epoch });

        if !self.recapture() {
            error!(
                target: LOG_TARGET,
                "positions unusable after resize; rotation stopped until the next resize"
            );
            self.journal.record(JournalEntry::LoopStopped {
                reason: "layout not ready after resize".into(),
            });
            return;
        }

        self.state.eligible = true;
        self.state.phase = SchedulerPhase::Running;
        let settle = self.config.resize_settle();
        self.schedule_timer(settle, TimerPurpose::ResizeSettle);
    }

    /// Capture positions into a new epoch.
    ///
    /// Returns false, and leaves the positions cleared, when the layout is not
    /// ready. Capturing clears every icon's residual offset.
    fn recapture(&mut self) -> bool {
        self.state.epoch += 1;
        self.state.positions = None;
        match capture_positions(&mut self.host) {
            Ok(positions) => {
                let icons = positions.len();
                self.state.positions = Some(SlotPositions::new(self.state.epoch, positions));
                debug!(target: LOG_TARGET, epoch = self.state.epoch, icons, "positions captured");
                self.journal.record(JournalEntry::LayoutCaptured {
                    epoch: self.state.epoch,
                    icons,
                });
                true
            }
            Err(e) => {
                warn!(target: LOG_TARGET, epoch = self.state.epoch, error = %e, "layout not ready");
                self.journal.record(JournalEntry::LayoutNotReady {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    fn disable(&mut self, error: String) {
        error!(target: LOG_TARGET, error = %error, "grid rotation disabled");
        self.journal.record(JournalEntry::SetupFailed { error });
        self.state.eligible = false;
        self.state.phase = SchedulerPhase::Disabled;
        self.clear_timers(|_| true);
    }
}
