#![forbid(unsafe_code)]

//! Virtual-clock implementation of [`Host`].
//!
//! `SimHost` behaves like a browser page with a frozen clock: nothing happens
//! until the driver asks for the next due event. Frames land on 16 ms
//! boundaries, timers fire after their delay, and transitions finish after
//! their duration. Cancelling a transition settles it as aborted on the
//! next event pull, never synchronously.
//!
//! Faults are queued up front and consumed by the transitions they match.

use std::collections::{BTreeMap, VecDeque};

use gridspin_core::{Offset, Position, Size, Slot, TransitionSpec};
use gridspin_runtime::{FrameId, Host, HostError, TimerId, TransitionId, TransitionOutcome};
use web_time::Duration;

/// Frame interval of the simulated display.
pub const FRAME_INTERVAL_MS: u64 = 16;

/// A callback the host owes the animator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Frame(FrameId),
    Timer(TimerId),
    Settled(TransitionId, TransitionOutcome),
    ContainerResized(Size),
    WindowResize,
}

#[derive(Debug, Clone, PartialEq)]
enum Scheduled {
    Frame(FrameId),
    Timer(TimerId),
    TransitionEnd(TransitionId),
    Immediate(SimEvent),
}

/// How a queued fault settles the transition it is attached to.
#[derive(Debug, Clone)]
struct Fault {
    icon: Option<Slot>,
    outcome: TransitionOutcome,
}

/// A transition the host is currently running.
#[derive(Debug, Clone)]
pub struct ActiveTransition {
    pub spec: TransitionSpec,
    pub started_at: Duration,
    outcome: TransitionOutcome,
}

/// One call to [`Host::animate`] that returned a handle.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimateCall {
    pub at: Duration,
    pub id: TransitionId,
    pub spec: TransitionSpec,
}

/// Deterministic in-memory host.
#[derive(Debug)]
pub struct SimHost {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    layout: Vec<Position>,
    container: Size,
    observing: bool,
    resize_listener: bool,
    queue: BTreeMap<(Duration, u64), Scheduled>,
    active: BTreeMap<TransitionId, ActiveTransition>,
    faults: VecDeque<Fault>,
    reject_animate: VecDeque<String>,
    unmeasurable: Option<Slot>,
    uncleared: Option<Slot>,
    fail_observe: Option<String>,
    fail_attach: Option<String>,
    animate_log: Vec<AnimateCall>,
    cancel_log: Vec<(Duration, Slot)>,
    timer_log: Vec<(Duration, Duration)>,
    cleared_offsets: usize,
}

impl SimHost {
    /// A host whose icons sit at `layout` inside a container of `container`.
    #[must_use]
    pub fn new(layout: Vec<Position>, container: Size) -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            layout,
            container,
            observing: false,
            resize_listener: false,
            queue: BTreeMap::new(),
            active: BTreeMap::new(),
            faults: VecDeque::new(),
            reject_animate: VecDeque::new(),
            unmeasurable: None,
            uncleared: None,
            fail_observe: None,
            fail_attach: None,
            animate_log: Vec::new(),
            cancel_log: Vec::new(),
            timer_log: Vec::new(),
            cleared_offsets: 0,
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the clock forward without delivering anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    // ── Page-side changes ───────────────────────────────────────────────

    /// Report a new container size to an active observer.
    pub fn resize_container(&mut self, size: Size) {
        self.container = size;
        if self.observing {
            self.push_now(Scheduled::Immediate(SimEvent::ContainerResized(size)));
        }
    }

    /// Replace the natural icon positions, as a reflow would.
    pub fn set_layout(&mut self, layout: Vec<Position>) {
        self.layout = layout;
    }

    /// A window resize: new container size, new layout, and an event to the
    /// resize listener if one is attached.
    pub fn resize_window(&mut self, size: Size, layout: Vec<Position>) {
        self.set_layout(layout);
        self.resize_container(size);
        if self.resize_listener {
            self.push_now(Scheduled::Immediate(SimEvent::WindowResize));
        }
    }

    // ── Fault injection ─────────────────────────────────────────────────

    /// The next transition started (on any icon) settles as failed.
    pub fn fail_next_transition(&mut self, message: impl Into<String>) {
        self.faults.push_back(Fault {
            icon: None,
            outcome: TransitionOutcome::Failed(message.into()),
        });
    }

    /// The next transition started on `icon` settles as failed.
    pub fn fail_next_transition_of(&mut self, icon: Slot, message: impl Into<String>) {
        self.faults.push_back(Fault {
            icon: Some(icon),
            outcome: TransitionOutcome::Failed(message.into()),
        });
    }

    /// The next transition started on `icon` settles as aborted.
    pub fn abort_next_transition_of(&mut self, icon: Slot) {
        self.faults.push_back(Fault {
            icon: Some(icon),
            outcome: TransitionOutcome::Aborted,
        });
    }

    /// The next `animate` call returns an error instead of a handle.
    pub fn reject_next_animate(&mut self, message: impl Into<String>) {
        self.reject_animate.push_back(message.into());
    }

    /// Measuring `icon` fails until cleared with `None`.
    pub fn set_unmeasurable(&mut self, icon: Option<Slot>) {
        self.unmeasurable = icon;
    }

    /// Resetting `icon`'s offset fails until cleared with `None`.
    pub fn set_uncleared(&mut self, icon: Option<Slot>) {
        self.uncleared = icon;
    }

    /// `observe_container` fails with `message`.
    pub fn fail_observe(&mut self, message: impl Into<String>) {
        self.fail_observe = Some(message.into());
    }

    /// `attach_resize_listener` fails with `message`.
    pub fn fail_attach(&mut self, message: impl Into<String>) {
        self.fail_attach = Some(message.into());
    }

    // ── Inspection ──────────────────────────────────────────────────────

    /// Every transition started so far, oldest first.
    #[must_use]
    pub fn animate_log(&self) -> &[AnimateCall] {
        &self.animate_log
    }

    /// Every `(time, icon)` cancellation request.
    #[must_use]
    pub fn cancel_log(&self) -> &[(Duration, Slot)] {
        &self.cancel_log
    }

    /// Every `(time set, delay)` timer request.
    #[must_use]
    pub fn timer_log(&self) -> &[(Duration, Duration)] {
        &self.timer_log
    }

    /// Number of `clear_offset` calls.
    #[must_use]
    pub fn cleared_offsets(&self) -> usize {
        self.cleared_offsets
    }

    /// Transitions still running.
    pub fn active(&self) -> impl Iterator<Item = (&TransitionId, &ActiveTransition)> {
        self.active.iter()
    }

    /// Pending timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.queue
            .values()
            .filter(|s| matches!(s, Scheduled::Timer(_)))
            .count()
    }

    /// Pending frame requests.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.queue
            .values()
            .filter(|s| matches!(s, Scheduled::Frame(_)))
            .count()
    }

    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    #[must_use]
    pub fn has_resize_listener(&self) -> bool {
        self.resize_listener
    }

    /// Natural layout position of `icon`.
    #[must_use]
    pub fn natural_position(&self, icon: Slot) -> Option<Position> {
        self.layout.get(icon).copied()
    }

    /// Visual offset `icon` is drawn at right now.
    ///
    /// Finished transitions do not persist their last keyframe, so an icon
    /// with nothing running draws at `Offset::ZERO`.
    #[must_use]
    pub fn rendered_offset(&self, icon: Slot) -> Offset {
        self.active
            .values()
            .rev()
            .find(|t| t.spec.icon == icon)
            .map_or(Offset::ZERO, |t| {
                t.spec.sample(self.now.saturating_sub(t.started_at))
            })
    }

    // ── Event pump ──────────────────────────────────────────────────────

    /// Time of the earliest owed callback.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|&(at, _)| at)
    }

    /// Remove and return the earliest callback due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<(Duration, SimEvent)> {
        let (&key, _) = self.queue.iter().next()?;
        if key.0 > until {
            return None;
        }
        let scheduled = self.queue.remove(&key)?;
        self.now = self.now.max(key.0);
        let event = match scheduled {
            Scheduled::Frame(id) => SimEvent::Frame(id),
            Scheduled::Timer(id) => SimEvent::Timer(id),
            Scheduled::Immediate(event) => event,
            Scheduled::TransitionEnd(id) => {
                let outcome = self
                    .active
                    .remove(&id)
                    .map_or(TransitionOutcome::Aborted, |t| t.outcome);
                SimEvent::Settled(id, outcome)
            }
        };
        Some((key.0, event))
    }

    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn push_at(&mut self, at: Duration, item: Scheduled) {
        self.next_seq += 1;
        self.queue.insert((at, self.next_seq), item);
    }

    fn push_now(&mut self, item: Scheduled) {
        self.push_at(self.now, item);
    }

    fn take_fault(&mut self, icon: Slot) -> Option<TransitionOutcome> {
        let index = self
            .faults
            .iter()
            .position(|f| f.icon.is_none_or(|i| i == icon))?;
        self.faults.remove(index).map(|f| f.outcome)
    }
}

impl Host for SimHost {
    fn icon_count(&self) -> usize {
        self.layout.len()
    }

    fn layout_position(&mut self, icon: Slot) -> Result<Position, HostError> {
        if self.unmeasurable == Some(icon) {
            return Err(HostError::new(format!("icon {icon} is detached")));
        }
        self.layout
            .get(icon)
            .copied()
            .ok_or_else(|| HostError::new(format!("no icon {icon}")))
    }

    fn clear_offset(&mut self, icon: Slot) -> Result<(), HostError> {
        if self.uncleared == Some(icon) {
            return Err(HostError::new(format!("icon {icon} style is read-only")));
        }
        self.cleared_offsets += 1;
        Ok(())
    }

    fn animate(&mut self, spec: &TransitionSpec) -> Result<TransitionId, HostError> {
        if let Some(message) = self.reject_animate.pop_front() {
            return Err(HostError::new(message));
        }
        let id = TransitionId(self.id());
        let outcome = self
            .take_fault(spec.icon)
            .unwrap_or(TransitionOutcome::Finished);
        self.active.insert(
            id,
            ActiveTransition {
                spec: spec.clone(),
                started_at: self.now,
                outcome,
            },
        );
        self.push_at(self.now + spec.duration, Scheduled::TransitionEnd(id));
        self.animate_log.push(AnimateCall {
            at: self.now,
            id,
            spec: spec.clone(),
        });
        Ok(id)
    }

    fn cancel_transitions(&mut self, icon: Slot) -> Result<(), HostError> {
        self.cancel_log.push((self.now, icon));
        let ids: Vec<TransitionId> = self
            .active
            .iter()
            .filter(|(_, t)| t.spec.icon == icon)
            .map(|(&id, _)| id)
            .collect();
        for id in ids {
            self.active.remove(&id);
            self.queue
                .retain(|_, s| *s != Scheduled::TransitionEnd(id));
            self.push_now(Scheduled::Immediate(SimEvent::Settled(
                id,
                TransitionOutcome::Aborted,
            )));
        }
        Ok(())
    }

    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.id());
        let now_ms = u64::try_from(self.now.as_millis()).unwrap_or(u64::MAX);
        let due = (now_ms / FRAME_INTERVAL_MS + 1) * FRAME_INTERVAL_MS;
        self.push_at(Duration::from_millis(due), Scheduled::Frame(id));
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.queue.retain(|_, s| *s != Scheduled::Frame(id));
    }

    fn set_timer(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.id());
        self.timer_log.push((self.now, delay));
        self.push_at(self.now + delay, Scheduled::Timer(id));
        id
    }

    fn clear_timer(&mut self, id: TimerId) {
        self.queue.retain(|_, s| *s != Scheduled::Timer(id));
    }

    fn observe_container(&mut self) -> Result<(), HostError> {
        if let Some(message) = &self.fail_observe {
            return Err(HostError::new(message.clone()));
        }
        self.observing = true;
        // Observers report the current size once on attach.
        self.push_now(Scheduled::Immediate(SimEvent::ContainerResized(
            self.container,
        )));
        Ok(())
    }

    fn unobserve_container(&mut self) {
        self.observing = false;
    }

    fn attach_resize_listener(&mut self) -> Result<(), HostError> {
        if let Some(message) = &self.fail_attach {
            return Err(HostError::new(message.clone()));
        }
        self.resize_listener = true;
        Ok(())
    }
}
