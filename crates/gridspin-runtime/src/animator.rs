#![forbid(unsafe_code)]

//! [`GridAnimator`]: the owner of all rotator state.
//!
//! The animator is a plain state machine. The host calls one of the `on_*`
//! entry points whenever something it was asked for happens (a frame, a
//! timer, a settled transition, a size change); the animator reacts by
//! updating its state and issuing new requests through [`Host`]. Entry points
//! never return errors: failures are logged under the `gridspin.animator`
//! target, recorded in the [`Journal`], and folded into the phase.
//!
//! The step logic lives in [`scheduler`](crate::scheduler), readiness and
//! resize handling in [`watcher`](crate::watcher).

use gridspin_core::PermutationMap;
use serde::Serialize;
use tracing::{trace, warn};
use web_time::Duration;

use crate::config::AnimatorConfig;
use crate::error::AnimatorError;
use crate::host::{Host, TimerId};
use crate::journal::Journal;
use crate::oracle::SlotPositions;
use crate::scheduler::SchedulerPhase;
use crate::state::{AnimatorState, TimerPurpose};

/// `tracing` target for every event the animator emits.
pub const LOG_TARGET: &str = "gridspin.animator";

/// Snapshot of the animator for debug overlays and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnimatorStatus {
    pub phase: SchedulerPhase,
    pub offset: usize,
    pub eligible: bool,
    pub epoch: u64,
    pub retry_attempt: u32,
    pub in_flight: bool,
}

/// Keeps a grid of icons rotating along a [`PermutationMap`].
#[derive(Debug)]
pub struct GridAnimator<H: Host> {
    pub(crate) host: H,
    pub(crate) config: AnimatorConfig,
    pub(crate) map: PermutationMap,
    pub(crate) icon_count: usize,
    pub(crate) state: AnimatorState,
    pub(crate) journal: Journal,
}

impl<H: Host> GridAnimator<H> {
    /// Create an animator over `host`'s icons.
    ///
    /// Nothing happens until [`start`](Self::start) is called.
    ///
    /// # Errors
    ///
    /// Fails if `config` does not validate or the host has fewer than two
    /// icons. A path that mentions slots the grid does not have, or that
    /// leaves some icons out, is accepted with a warning.
    pub fn new(host: H, config: AnimatorConfig) -> Result<Self, AnimatorError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(AnimatorError::Config(errors));
        }
        let map = config.permutation_map()?;

        let icon_count = host.icon_count();
        if icon_count < 2 {
            return Err(AnimatorError::TooFewIcons { count: icon_count });
        }
        if map.max_slot() >= icon_count {
            warn!(
                target: LOG_TARGET,
                icons = icon_count,
                max_slot = map.max_slot(),
                "rotation path refers to slots the grid does not have"
            );
        } else if map.len() != icon_count {
            warn!(
                target: LOG_TARGET,
                icons = icon_count,
                path_len = map.len(),
                "rotation path does not cover every icon"
            );
        }

        let journal = Journal::new(config.journal_capacity);
        Ok(Self {
            host,
            config,
            map,
            icon_count,
            state: AnimatorState::new(),
            journal,
        })
    }

    /// A timer set by the animator fired.
    pub fn on_timer(&mut self, id: TimerId) {
        let Some(purpose) = self.state.timers.remove(&id) else {
            trace!(target: LOG_TARGET, timer = id.0, "ignoring unknown timer");
            return;
        };
        if self.state.phase == SchedulerPhase::Disabled {
            return;
        }
        match purpose {
            TimerPurpose::InitialSettle | TimerPurpose::ResizeSettle | TimerPurpose::RetryBackoff => {
                if !self.state.eligible || self.state.in_flight.is_some() {
                    return;
                }
                self.state.phase = SchedulerPhase::Running;
                self.request_step_frame();
            }
            TimerPurpose::ResizeDebounce => self.handle_resize(),
        }
    }

    /// Path-steps applied in the current layout epoch, in `[0, N)`.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        self.state.offset
    }

    /// Whether the loop may schedule or run steps.
    #[inline]
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.state.eligible
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        self.state.phase
    }

    /// Positions of the current layout epoch, if captured.
    #[must_use]
    pub fn positions(&self) -> Option<&SlotPositions> {
        self.state.positions.as_ref()
    }

    /// Current layout epoch. Incremented on every capture attempt.
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.state.epoch
    }

    /// Number of icons in the grid.
    #[inline]
    #[must_use]
    pub fn icon_count(&self) -> usize {
        self.icon_count
    }

    #[must_use]
    pub fn map(&self) -> &PermutationMap {
        &self.map
    }

    #[must_use]
    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host, for drivers that deliver its callbacks.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    #[must_use]
    pub fn status(&self) -> AnimatorStatus {
        AnimatorStatus {
            phase: self.state.phase,
            offset: self.state.offset,
            eligible: self.state.eligible,
            epoch: self.state.epoch,
            retry_attempt: self.state.retry_attempt,
            in_flight: self.state.in_flight.is_some(),
        }
    }

    /// Consume the animator and return its host.
    pub fn into_host(self) -> H {
        self.host
    }

    pub(crate) fn schedule_timer(&mut self, delay: Duration, purpose: TimerPurpose) {
        let id = self.host.set_timer(delay);
        self.state.timers.insert(id, purpose);
    }

    /// Withdraw every pending timer whose purpose matches `filter`.
    pub(crate) fn clear_timers(&mut self, filter: impl Fn(TimerPurpose) -> bool) {
        let ids: Vec<TimerId> = self
            .state
            .timers
            .iter()
            .filter(|&(_, &purpose)| filter(purpose))
            .map(|(&id, _)| id)
            .collect();
        for id in ids {
            self.state.timers.remove(&id);
            self.host.clear_timer(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FrameId, HostError, TransitionId, TransitionOutcome};
    use crate::journal::JournalEntry;
    use gridspin_core::{Position, Size, Slot, TransitionSpec};

    /// Records requests and lets the test deliver callbacks by hand.
    #[derive(Debug, Default)]
    struct ManualHost {
        positions: Vec<Position>,
        next_id: u64,
        frames: Vec<FrameId>,
        timers: Vec<(TimerId, Duration)>,
        started: Vec<(TransitionId, TransitionSpec)>,
        cancelled: Vec<Slot>,
        observe_fails: bool,
    }

    impl ManualHost {
        fn grid(n: usize) -> Self {
            Self {
                positions: (0..n)
                    .map(|i| Position::new(i as f64 * 50.0, 10.0))
                    .collect(),
                ..Self::default()
            }
        }

        fn id(&mut self) -> u64 {
            self.next_id += 1;
            self.next_id
        }
    }

    impl Host for ManualHost {
        fn icon_count(&self) -> usize {
            self.positions.len()
        }

        fn layout_position(&mut self, icon: Slot) -> Result<Position, HostError> {
            Ok(self.positions[icon])
        }

        fn clear_offset(&mut self, _icon: Slot) -> Result<(), HostError> {
            Ok(())
        }

        fn animate(&mut self, spec: &TransitionSpec) -> Result<TransitionId, HostError> {
            let id = TransitionId(self.id());
            self.started.push((id, spec.clone()));
            Ok(id)
        }

        fn cancel_transitions(&mut self, icon: Slot) -> Result<(), HostError> {
            self.cancelled.push(icon);
            Ok(())
        }

        fn request_frame(&mut self) -> FrameId {
            let id = FrameId(self.id());
            self.frames.push(id);
            id
        }

        fn cancel_frame(&mut self, id: FrameId) {
            self.frames.retain(|&f| f != id);
        }

        fn set_timer(&mut self, delay: Duration) -> TimerId {
            let id = TimerId(self.id());
            self.timers.push((id, delay));
            id
        }

        fn clear_timer(&mut self, id: TimerId) {
            self.timers.retain(|&(t, _)| t != id);
        }

        fn observe_container(&mut self) -> Result<(), HostError> {
            if self.observe_fails {
                Err(HostError::new("ResizeObserver is not defined"))
            } else {
                Ok(())
            }
        }

        fn unobserve_container(&mut self) {}

        fn attach_resize_listener(&mut self) -> Result<(), HostError> {
            Ok(())
        }
    }

    fn three_cycle() -> AnimatorConfig {
        AnimatorConfig::default().with_path(vec![vec![0, 1, 2]])
    }

    /// Start, report a size, fire the settle timer, and run the first frame.
    fn running(host: ManualHost) -> GridAnimator<ManualHost> {
        let mut a = GridAnimator::new(host, three_cycle()).unwrap();
        a.start();
        a.on_container_resized(Size::new(300.0, 100.0));
        let (timer, _) = a.host_mut().timers.remove(0);
        a.on_timer(timer);
        let frame = a.host_mut().frames.pop().unwrap();
        a.on_frame(frame);
        a
    }

    #[test]
    fn rejects_single_icon() {
        let err = GridAnimator::new(ManualHost::grid(1), three_cycle()).unwrap_err();
        assert_eq!(err, AnimatorError::TooFewIcons { count: 1 });
    }

    #[test]
    fn rejects_invalid_config() {
        let config = AnimatorConfig {
            step_duration_ms: 0,
            ..three_cycle()
        };
        let err = GridAnimator::new(ManualHost::grid(3), config).unwrap_err();
        assert!(matches!(err, AnimatorError::Config(_)), "{err}");
    }

    #[test]
    fn nothing_happens_before_start() {
        let mut a = GridAnimator::new(ManualHost::grid(3), three_cycle()).unwrap();
        a.on_container_resized(Size::new(300.0, 100.0));
        assert_eq!(a.phase(), SchedulerPhase::Idle);
        assert!(a.host().timers.is_empty());
    }

    #[test]
    fn readiness_schedules_initial_settle() {
        let mut a = GridAnimator::new(ManualHost::grid(3), three_cycle()).unwrap();
        a.start();
        a.on_container_resized(Size::new(300.0, 100.0));
        assert!(a.is_eligible());
        assert_eq!(a.host().timers.len(), 1);
        assert_eq!(a.host().timers[0].1, Duration::from_millis(100));
        assert_eq!(a.epoch(), 1);
    }

    #[test]
    fn zero_size_does_not_start() {
        let mut a = GridAnimator::new(ManualHost::grid(3), three_cycle()).unwrap();
        a.start();
        a.on_container_resized(Size::new(0.0, 0.0));
        assert!(!a.is_eligible());
        assert!(a.host().timers.is_empty());
        assert!(a.positions().is_none());
    }

    #[test]
    fn observe_failure_disables() {
        let host = ManualHost {
            observe_fails: true,
            ..ManualHost::grid(3)
        };
        let mut a = GridAnimator::new(host, three_cycle()).unwrap();
        a.start();
        assert_eq!(a.phase(), SchedulerPhase::Disabled);
        a.on_container_resized(Size::new(300.0, 100.0));
        a.on_window_resize();
        assert!(a.host().timers.is_empty());
        assert!(matches!(
            a.journal().last(),
            Some(JournalEntry::SetupFailed { .. })
        ));
    }

    #[test]
    fn step_advances_only_after_every_transition_settles() {
        let mut a = running(ManualHost::grid(3));
        assert_eq!(a.phase(), SchedulerPhase::Animating);
        let ids: Vec<TransitionId> = a.host().started.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids.len(), 3);

        a.on_transition_settled(ids[0], TransitionOutcome::Finished);
        a.on_transition_settled(ids[1], TransitionOutcome::Finished);
        assert_eq!(a.offset(), 0);
        a.on_transition_settled(ids[2], TransitionOutcome::Finished);
        assert_eq!(a.offset(), 1);
        assert_eq!(a.phase(), SchedulerPhase::Running);
        assert_eq!(a.host().frames.len(), 1);
    }

    #[test]
    fn stale_frame_is_ignored() {
        let mut a = running(ManualHost::grid(3));
        let before = a.host().started.len();
        a.on_frame(FrameId(9_999));
        assert_eq!(a.host().started.len(), before);
    }

    #[test]
    fn failure_schedules_retry_at_same_offset() {
        let mut a = running(ManualHost::grid(3));
        let (id, _) = a.host().started[1].clone();
        a.on_transition_settled(id, TransitionOutcome::Failed("boom".into()));
        assert_eq!(a.phase(), SchedulerPhase::RetryScheduled);
        assert_eq!(a.offset(), 0);
        // Leftover transitions of the failed step are cancelled.
        assert_eq!(a.host().cancelled.len(), 2);
        let (timer, delay) = a.host_mut().timers.pop().unwrap();
        assert_eq!(delay, Duration::from_millis(500));
        assert_eq!(a.status().retry_attempt, 1);

        a.on_timer(timer);
        let frame = a.host_mut().frames.pop().unwrap();
        a.on_frame(frame);
        let retried: Vec<&TransitionSpec> = a.host().started[3..].iter().map(|(_, s)| s).collect();
        let first: Vec<&TransitionSpec> = a.host().started[..3].iter().map(|(_, s)| s).collect();
        assert_eq!(retried, first);
    }

    #[test]
    fn abort_stops_silently() {
        let mut a = running(ManualHost::grid(3));
        let (id, _) = a.host().started[0].clone();
        a.on_transition_settled(id, TransitionOutcome::Aborted);
        assert_eq!(a.phase(), SchedulerPhase::Stopped);
        assert_eq!(a.offset(), 0);
        assert!(a.host().frames.is_empty());
        assert!(a.host().timers.is_empty());
    }

    #[test]
    fn status_serializes_phase_in_snake_case() {
        let a = running(ManualHost::grid(3));
        let json = serde_json::to_value(a.status()).unwrap();
        assert_eq!(json["phase"], "animating");
        assert_eq!(json["in_flight"], true);
    }
}
