#![forbid(unsafe_code)]

//! Step scheduler: one simultaneous move of every icon at a time.
//!
//! # State machine
//!
//! ```text
//!  Idle ──capture ok──► Running ──frame──► Animating ──all settled──► Running ─► …
//!                          ▲                  │
//!                          │                  ├─failed──► RetryScheduled ──backoff──┐
//!                          └──────────────────┼─────────────────────────────────────┘
//!                                             ├─aborted─────────► Stopped
//!                                             └─retries exhausted► Stopped
//!  any ──resize──► Stopped ──capture ok──► Running
//!  Idle ──observe fails──► Disabled
//! ```
//!
//! # Invariants
//!
//! 1. At most one step is in flight: `run_step` is a no-op while one is.
//! 2. The offset changes only in `complete_step`, by `+1 mod N`, after every
//!    transition of the step has settled.
//! 3. A failed step is retried at the same offset; an aborted step is not
//!    retried.
//! 4. Settle notifications are matched against the in-flight step's own
//!    transition ids; anything else (stale epoch, cancelled step) is ignored.
//!
//! # Failure Modes
//!
//! - Missing, mis-sized, or all-zero positions when a step starts: the loop
//!   stops. This cannot happen in a healthy epoch, so it is not retried.
//! - `Host::animate` returning an error: handled like a failed transition.

use gridspin_core::{PermutationMap, Slot, TransitionSpec};
use serde::Serialize;
use tracing::{debug, debug_span, error, trace, warn};

use crate::animator::{GridAnimator, LOG_TARGET};
use crate::config::AnimatorConfig;
use crate::host::{FrameId, Host, TransitionId, TransitionOutcome};
use crate::journal::JournalEntry;
use crate::oracle::SlotPositions;
use crate::state::{InFlightStep, TimerPurpose};

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// Waiting for the container to be laid out.
    Idle,
    /// Between steps: a settle timer or frame request is pending.
    Running,
    /// A step's transitions are in flight.
    Animating,
    /// The last step failed; a retry timer is pending.
    RetryScheduled,
    /// Not scheduling steps until the next successful layout capture.
    Stopped,
    /// Host wiring failed; every event is ignored.
    Disabled,
}

/// Identity of one started step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepToken {
    /// Layout epoch the step's positions come from.
    pub epoch: u64,
    /// Monotonic step counter.
    pub generation: u64,
}

/// Why an icon does not move in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The walk along the path hit a slot without a successor.
    Undefined,
    /// Start and end slot are the same (includes icons outside the path).
    Stationary,
    /// The start or end slot has no captured position.
    MissingPosition,
    /// A computed offset is NaN or infinite.
    NotFinite,
    /// The move is below the movement threshold on both axes.
    BelowThreshold,
}

/// Transitions for one step, computed from positions and the offset alone.
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    /// Offset the step starts from.
    pub offset: usize,
    /// One transition per moving icon, in icon order.
    pub transitions: Vec<TransitionSpec>,
    /// Icons left untouched, with the reason.
    pub skipped: Vec<(Slot, SkipReason)>,
}

/// Compute every icon's move from offset `k` to `k + 1`.
///
/// Offsets are relative to each icon's own captured position, so an icon at
/// rest draws at `Offset::ZERO`. Nothing here depends on earlier steps.
#[must_use]
pub fn plan_step(
    map: &PermutationMap,
    positions: &SlotPositions,
    offset: usize,
    config: &AnimatorConfig,
) -> StepPlan {
    let mut plan = StepPlan {
        offset,
        transitions: Vec::with_capacity(positions.len()),
        skipped: Vec::new(),
    };

    for icon in 0..positions.len() {
        let own = positions[icon];
        let (Some(start), Some(end)) = (map.follow(icon, offset), map.follow(icon, offset + 1))
        else {
            plan.skipped.push((icon, SkipReason::Undefined));
            continue;
        };
        if start == end {
            plan.skipped.push((icon, SkipReason::Stationary));
            continue;
        }
        let (Some(start_pos), Some(end_pos)) = (positions.get(start), positions.get(end)) else {
            plan.skipped.push((icon, SkipReason::MissingPosition));
            continue;
        };
        let from = start_pos - own;
        let to = end_pos - own;
        if !from.is_finite() || !to.is_finite() {
            plan.skipped.push((icon, SkipReason::NotFinite));
            continue;
        }
        if !from.moves_to(to, config.movement_threshold) {
            plan.skipped.push((icon, SkipReason::BelowThreshold));
            continue;
        }
        plan.transitions.push(TransitionSpec {
            icon,
            from,
            to,
            duration: config.step_duration(),
            easing: config.easing,
        });
    }
    plan
}

impl<H: Host> GridAnimator<H> {
    /// A frame callback arrived.
    ///
    /// Only the most recently requested frame runs a step; anything else was
    /// cancelled and is ignored.
    pub fn on_frame(&mut self, id: FrameId) {
        if self.state.pending_frame != Some(id) {
            trace!(target: LOG_TARGET, frame = id.0, "ignoring stale frame");
            return;
        }
        self.state.pending_frame = None;
        self.run_step();
    }

    /// A transition settled.
    pub fn on_transition_settled(&mut self, id: TransitionId, outcome: TransitionOutcome) {
        let Some(step) = self.state.in_flight.as_mut() else {
            trace!(target: LOG_TARGET, %id, "settle with no step in flight");
            return;
        };
        if step.pending.remove(&id).is_none() {
            trace!(target: LOG_TARGET, %id, "settle for a transition of another step");
            return;
        }
        let done = step.pending.is_empty();
        match outcome {
            TransitionOutcome::Finished => {
                if done {
                    self.complete_step();
                }
            }
            TransitionOutcome::Aborted => self.abort_step(),
            TransitionOutcome::Failed(error) => self.fail_step(error),
        }
    }

    /// Replace any pending frame request with a fresh one.
    pub(crate) fn request_step_frame(&mut self) {
        if let Some(old) = self.state.pending_frame.take() {
            self.host.cancel_frame(old);
        }
        self.state.pending_frame = Some(self.host.request_frame());
    }

    /// Start the step at the current offset.
    pub(crate) fn run_step(&mut self) {
        if let Some(frame) = self.state.pending_frame.take() {
            self.host.cancel_frame(frame);
        }
        if !self.state.eligible || self.state.in_flight.is_some() {
            trace!(
                target: LOG_TARGET,
                eligible = self.state.eligible,
                in_flight = self.state.in_flight.is_some(),
                "step request ignored"
            );
            return;
        }

        let offset = self.state.offset;
        let epoch = self.state.epoch;
        let plan = self
            .state
            .positions
            .as_ref()
            .filter(|p| p.epoch() == epoch && p.len() == self.icon_count && !p.is_degenerate())
            .map(|p| plan_step(&self.map, p, offset, &self.config));
        let Some(plan) = plan else {
            self.stop_on_bad_geometry();
            return;
        };

        self.state.generation += 1;
        let token = StepToken {
            epoch: self.state.epoch,
            generation: self.state.generation,
        };
        let _span = debug_span!(
            target: LOG_TARGET,
            "gridspin.step",
            epoch = token.epoch,
            offset = offset,
            generation = token.generation,
        )
        .entered();

        let mut step = InFlightStep {
            token,
            offset,
            pending: Default::default(),
        };
        let mut start_error = None;
        for spec in &plan.transitions {
            match self.host.animate(spec) {
                Ok(id) => {
                    step.pending.insert(id, spec.icon);
                }
                Err(e) => {
                    start_error = Some(format!("starting transition for icon {}: {e}", spec.icon));
                    break;
                }
            }
        }

        debug!(
            target: LOG_TARGET,
            animated = step.pending.len(),
            skipped = plan.skipped.len(),
            "step started"
        );
        self.journal.record(JournalEntry::StepStarted {
            epoch: token.epoch,
            offset,
            animated: step.pending.len(),
            skipped: plan.skipped.len(),
        });

        let settled = step.pending.is_empty();
        self.state.in_flight = Some(step);
        self.state.phase = SchedulerPhase::Animating;

        if let Some(error) = start_error {
            self.fail_step(error);
        } else if settled {
            self.complete_step();
        }
    }

    fn complete_step(&mut self) {
        let Some(step) = self.state.in_flight.take() else {
            return;
        };
        let next = (step.offset + 1) % self.icon_count;
        self.state.offset = next;
        self.state.retry_attempt = 0;
        debug!(
            target: LOG_TARGET,
            epoch = step.token.epoch,
            offset = step.offset,
            next_offset = next,
            "step completed"
        );
        self.journal.record(JournalEntry::StepCompleted {
            epoch: step.token.epoch,
            offset: step.offset,
            next_offset: next,
        });

        if !self.state.eligible {
            self.state.phase = SchedulerPhase::Stopped;
            return;
        }
        self.state.phase = SchedulerPhase::Running;
        self.request_step_frame();
    }

    fn fail_step(&mut self, error: String) {
        let Some(step) = self.state.in_flight.take() else {
            return;
        };
        let mut leftover: Vec<Slot> = step.pending.values().copied().collect();
        leftover.sort_unstable();
        for icon in leftover {
            if let Err(e) = self.host.cancel_transitions(icon) {
                warn!(target: LOG_TARGET, icon, error = %e, "cancelling leftover transition failed");
            }
        }
        if !self.state.eligible {
            self.state.phase = SchedulerPhase::Stopped;
            return;
        }

        let attempt = self.state.retry_attempt;
        error!(
            target: LOG_TARGET,
            epoch = step.token.epoch,
            offset = step.offset,
            attempt,
            error = %error,
            "transition failed during step"
        );
        self.journal.record(JournalEntry::StepFailed {
            epoch: step.token.epoch,
            offset: step.offset,
            attempt,
            error,
        });

        if self.config.retry.should_retry(attempt) {
            let delay = self.config.retry.delay(attempt);
            self.state.retry_attempt = attempt + 1;
            self.schedule_timer(delay, TimerPurpose::RetryBackoff);
            self.state.phase = SchedulerPhase::RetryScheduled;
            self.journal.record(JournalEntry::RetryScheduled {
                offset: step.offset,
                attempt: attempt + 1,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            });
        } else {
            error!(
                target: LOG_TARGET,
                offset = step.offset,
                attempts = attempt,
                "retry budget exhausted; rotation stopped"
            );
            self.journal.record(JournalEntry::RetriesExhausted {
                offset: step.offset,
                attempts: attempt,
            });
            self.state.eligible = false;
            self.state.phase = SchedulerPhase::Stopped;
        }
    }

    fn abort_step(&mut self) {
        let Some(step) = self.state.in_flight.take() else {
            return;
        };
        debug!(
            target: LOG_TARGET,
            epoch = step.token.epoch,
            offset = step.offset,
            "step aborted"
        );
        self.journal.record(JournalEntry::StepAborted {
            epoch: step.token.epoch,
            offset: step.offset,
        });
        self.state.phase = SchedulerPhase::Stopped;
    }

    fn stop_on_bad_geometry(&mut self) {
        error!(
            target: LOG_TARGET,
            expected = self.icon_count,
            captured = self.state.positions.as_ref().map_or(0, SlotPositions::len),
            "step requested with invalid slot positions; rotation stopped"
        );
        self.journal.record(JournalEntry::LoopStopped {
            reason: "invalid slot positions".into(),
        });
        self.state.eligible = false;
        self.state.phase = SchedulerPhase::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridspin_core::{Offset, Position};

    /// Two rows of seven, 100 units apart.
    fn grid_positions() -> SlotPositions {
        let positions = (0..14)
            .map(|i| Position::new((i % 7) as f64 * 100.0, (i / 7) as f64 * 100.0))
            .collect();
        SlotPositions::new(1, positions)
    }

    #[test]
    fn first_step_moves_slot_seven_to_slot_zero() {
        let map = PermutationMap::default_grid();
        let plan = plan_step(&map, &grid_positions(), 0, &AnimatorConfig::default());
        assert_eq!(plan.transitions.len(), 14);
        assert!(plan.skipped.is_empty());
        let seven = plan.transitions.iter().find(|t| t.icon == 7).unwrap();
        assert_eq!(seven.from, Offset::ZERO);
        // slot 0 is at (0, 0), slot 7 at (0, 100).
        assert_eq!(seven.to, Offset::new(0.0, -100.0));
    }

    #[test]
    fn later_steps_start_where_the_previous_one_ended() {
        let map = PermutationMap::default_grid();
        let positions = grid_positions();
        let config = AnimatorConfig::default();
        for k in 0..30 {
            let a = plan_step(&map, &positions, k, &config);
            let b = plan_step(&map, &positions, k + 1, &config);
            for (ta, tb) in a.transitions.iter().zip(&b.transitions) {
                assert_eq!(ta.icon, tb.icon);
                assert_eq!(ta.to, tb.from, "icon {} at k={k}", ta.icon);
            }
        }
    }

    #[test]
    fn icons_outside_the_path_are_stationary() {
        let map = PermutationMap::from_cycle(&[0, 1, 2]).unwrap();
        let config = AnimatorConfig::default();
        for k in 0..6 {
            let plan = plan_step(&map, &grid_positions(), k, &config);
            assert!(plan.transitions.iter().all(|t| t.icon <= 2));
            for icon in 3..14 {
                assert!(plan.skipped.contains(&(icon, SkipReason::Stationary)));
            }
        }
    }

    #[test]
    fn undefined_walk_is_skipped() {
        let map = PermutationMap::from_pairs([(0, 1), (1, 2)]).unwrap();
        let plan = plan_step(&map, &grid_positions(), 1, &AnimatorConfig::default());
        assert!(plan.skipped.contains(&(0, SkipReason::Undefined)));
        assert!(plan.skipped.contains(&(1, SkipReason::Undefined)));
    }

    #[test]
    fn path_beyond_the_grid_has_missing_positions() {
        let map = PermutationMap::from_cycle(&[0, 20]).unwrap();
        let plan = plan_step(&map, &grid_positions(), 0, &AnimatorConfig::default());
        assert!(plan.transitions.is_empty());
        assert!(plan.skipped.contains(&(0, SkipReason::MissingPosition)));
    }

    #[test]
    fn tiny_moves_are_skipped() {
        let positions = SlotPositions::new(
            1,
            vec![Position::new(10.0, 10.0), Position::new(10.4, 10.9)],
        );
        let map = PermutationMap::from_cycle(&[0, 1]).unwrap();
        let plan = plan_step(&map, &positions, 0, &AnimatorConfig::default());
        assert!(plan.transitions.is_empty());
        assert_eq!(plan.skipped.len(), 2);
        assert!(plan.skipped.iter().all(|(_, r)| *r == SkipReason::BelowThreshold));
    }

    #[test]
    fn nan_positions_are_skipped() {
        let positions = SlotPositions::new(
            1,
            vec![
                Position::new(0.0, 0.0),
                Position::new(f64::NAN, 0.0),
                Position::new(200.0, 0.0),
            ],
        );
        let map = PermutationMap::from_cycle(&[0, 2]).unwrap();
        let plan = plan_step(&map, &positions, 0, &AnimatorConfig::default());
        assert_eq!(plan.transitions.len(), 2);
        assert!(plan.skipped.contains(&(1, SkipReason::Stationary)));

        let map = PermutationMap::from_cycle(&[0, 1]).unwrap();
        let plan = plan_step(&map, &positions, 0, &AnimatorConfig::default());
        assert!(plan.skipped.contains(&(0, SkipReason::NotFinite)));
    }

    #[test]
    fn transitions_carry_configured_timing() {
        let config = AnimatorConfig::default()
            .with_step_duration(web_time::Duration::from_millis(900))
            .with_easing(gridspin_core::Easing::Linear);
        let plan = plan_step(&PermutationMap::default_grid(), &grid_positions(), 3, &config);
        assert!(plan.transitions.iter().all(|t| {
            t.duration == web_time::Duration::from_millis(900)
                && t.easing == gridspin_core::Easing::Linear
        }));
    }
}
