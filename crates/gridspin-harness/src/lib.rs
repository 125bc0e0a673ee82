#![forbid(unsafe_code)]

//! Deterministic test harness for gridspin.
//!
//! - [`SimHost`]: a [`Host`](gridspin_runtime::Host) with a virtual clock,
//!   16 ms frames, timers, transitions that finish after their duration, and
//!   fault injection.
//! - [`Simulation`]: pumps the host's callbacks into a
//!   [`GridAnimator`](gridspin_runtime::GridAnimator) in due-time order.
//! - [`layouts`]: grid positions for common page shapes.
//! - [`capture`]: a `tracing_subscriber` layer for asserting on log output.
//!
//! Runs are fully reproducible: the same host setup and the same sequence of
//! `advance` calls produce the same journal, byte for byte.

pub mod capture;
pub mod layouts;
pub mod sim_host;
pub mod simulation;

pub use capture::{CaptureHandle, CapturedEvent, CapturedSpan, SpanCapture, with_captured_tracing};
pub use sim_host::{ActiveTransition, AnimateCall, FRAME_INTERVAL_MS, SimEvent, SimHost};
pub use simulation::Simulation;
