#![forbid(unsafe_code)]

//! Runtime: the step loop that keeps a grid of icons rotating.
//!
//! # Role in gridspin
//! `gridspin-runtime` owns all mutable state of the rotator in one
//! [`GridAnimator`]. It is host-driven: the embedding environment implements
//! [`Host`] (layout queries, transitions, frames, timers) and forwards every
//! callback it receives back into the animator. The animator never blocks,
//! never spawns, and never reads a clock.
//!
//! # Primary responsibilities
//! - **Position oracle** ([`oracle`]): capture each slot's layout position
//!   once per layout epoch.
//! - **Step scheduler** ([`scheduler`]): animate every icon one path-step,
//!   wait for all transitions to settle, advance the offset, repeat on the
//!   next frame; retry failed steps per [`RetryPolicy`].
//! - **Layout watcher** ([`watcher`]): start the loop once the container has
//!   a size, and restart it from offset 0 after a (debounced) resize.
//!
//! # Event flow
//!
//! ```text
//! host size observer ──► on_container_resized ──► capture ──► settle timer
//!                                                               │
//! on_frame ◄── request_frame ◄── on_timer ◄─────────────────────┘
//!    │
//!    └─► run_step ──► Host::animate × N ──► on_transition_settled × N
//!                                              │
//!                      offset += 1, request_frame ◄┘
//! ```

pub mod animator;
pub mod config;
pub mod error;
pub mod host;
pub mod journal;
pub mod oracle;
pub mod retry;
pub mod scheduler;
mod state;
pub mod watcher;

pub use animator::{AnimatorStatus, GridAnimator};
pub use config::{AnimatorConfig, ConfigError};
pub use error::{AnimatorError, LayoutNotReady};
pub use host::{
    FrameId, Host, HostError, MAX_TIMER_DELAY_MS, TimerId, TransitionId, TransitionOutcome,
};
pub use journal::{Journal, JournalEntry};
pub use oracle::{SlotPositions, capture_positions};
pub use retry::{BackoffStrategy, RetryPolicy};
pub use scheduler::{SchedulerPhase, SkipReason, StepPlan, StepToken, plan_step};
