#![forbid(unsafe_code)]

//! Drive a [`GridAnimator`] over a [`SimHost`] in virtual time.
//!
//! [`Simulation::advance`] pulls every callback the host owes, in due-time
//! order, and hands each one to the animator. Callbacks the animator causes
//! while handling an event are queued on the host and delivered by the same
//! pump, so a whole run of steps plays out inside one `advance` call.

use gridspin_core::{Position, Size};
use gridspin_runtime::{AnimatorConfig, AnimatorError, GridAnimator, JournalEntry};
use tracing::trace;
use web_time::Duration;

use crate::sim_host::{SimEvent, SimHost};

/// Upper bound on callbacks delivered by a single `advance`.
const MAX_EVENTS_PER_ADVANCE: usize = 1_000_000;

/// An animator wired to a simulated page.
#[derive(Debug)]
pub struct Simulation {
    animator: GridAnimator<SimHost>,
    delivered: usize,
}

impl Simulation {
    /// Build an animator over `host`. Does not call `start`.
    pub fn new(host: SimHost, config: AnimatorConfig) -> Result<Self, AnimatorError> {
        Ok(Self {
            animator: GridAnimator::new(host, config)?,
            delivered: 0,
        })
    }

    /// Build over `layout` in `container`, and start.
    pub fn started(
        layout: Vec<Position>,
        container: Size,
        config: AnimatorConfig,
    ) -> Result<Self, AnimatorError> {
        let mut sim = Self::new(SimHost::new(layout, container), config)?;
        sim.animator.start();
        Ok(sim)
    }

    #[must_use]
    pub fn animator(&self) -> &GridAnimator<SimHost> {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut GridAnimator<SimHost> {
        &mut self.animator
    }

    #[must_use]
    pub fn host(&self) -> &SimHost {
        self.animator.host()
    }

    pub fn host_mut(&mut self) -> &mut SimHost {
        self.animator.host_mut()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.host().now()
    }

    /// Total callbacks delivered so far.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Deliver everything due within the next `dt`, then move the clock to
    /// the end of the window. Returns the number of callbacks delivered.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let until = self.now() + dt;
        let mut count = 0;
        while count < MAX_EVENTS_PER_ADVANCE {
            let Some((at, event)) = self.host_mut().pop_due(until) else {
                break;
            };
            trace!(at_ms = at.as_millis() as u64, ?event, "deliver");
            self.deliver(event);
            count += 1;
        }
        self.host_mut().set_now(until);
        self.delivered += count;
        count
    }

    /// Advance in frame-sized slices until `done` holds or `limit` elapses.
    /// Returns whether `done` held.
    pub fn run_until(
        &mut self,
        limit: Duration,
        mut done: impl FnMut(&GridAnimator<SimHost>) -> bool,
    ) -> bool {
        let deadline = self.now() + limit;
        let slice = Duration::from_millis(crate::sim_host::FRAME_INTERVAL_MS);
        while self.now() < deadline {
            if done(&self.animator) {
                return true;
            }
            self.advance(slice.min(deadline - self.now()));
        }
        done(&self.animator)
    }

    /// Resize the window and reflow the grid.
    pub fn resize_window(&mut self, size: Size, layout: Vec<Position>) {
        self.host_mut().resize_window(size, layout);
    }

    /// Number of completed steps still held in the journal.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        self.animator
            .journal()
            .iter()
            .filter(|e| matches!(e, JournalEntry::StepCompleted { .. }))
            .count()
    }

    /// Drain the animator's journal as JSON lines tagged with `run_id`.
    pub fn drain_journal_jsonl(&mut self, run_id: &str) -> Vec<String> {
        self.animator.journal_mut().drain_jsonl(run_id)
    }

    fn deliver(&mut self, event: SimEvent) {
        match event {
            SimEvent::Frame(id) => self.animator.on_frame(id),
            SimEvent::Timer(id) => self.animator.on_timer(id),
            SimEvent::Settled(id, outcome) => self.animator.on_transition_settled(id, outcome),
            SimEvent::ContainerResized(size) => self.animator.on_container_resized(size),
            SimEvent::WindowResize => self.animator.on_window_resize(),
        }
    }
}
