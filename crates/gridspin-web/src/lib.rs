#![forbid(unsafe_code)]

//! WASM binding for the gridspin icon rotator.
//!
//! This crate exports [`GridRotator`] (on `wasm32` only), a `wasm-bindgen`
//! struct that wraps `gridspin_runtime::GridAnimator` for host-driven use from
//! JavaScript. The page supplies a `GridHost` object that does the DOM work,
//! and forwards every browser callback back into the rotator:
//!
//! ```js
//! const host = {
//!   iconCount: () => icons.length,
//!   layoutPosition: (i) => [icons[i].offsetLeft, icons[i].offsetTop],
//!   clearOffset: (i) => { icons[i].style.transform = ""; },
//!   animate: (i, from, to, durationMs, easing) => {
//!     const id = nextId++;
//!     icons[i].animate([{ transform: from }, { transform: to }],
//!                      { duration: durationMs, easing, fill: "none" })
//!       .finished.then(() => rotator.transitionFinished(id),
//!                      (e) => rotator.transitionRejected(id, e.name, e.message));
//!     return id;
//!   },
//!   cancelTransitions: (i) => icons[i].getAnimations().forEach((a) => a.cancel()),
//!   requestFrame: () => {
//!     const id = requestAnimationFrame(() => rotator.frame(id));
//!     return id;
//!   },
//!   cancelFrame: (id) => cancelAnimationFrame(id),
//!   setTimer: (delayMs) => {
//!     const id = setTimeout(() => rotator.timerFired(id), delayMs);
//!     return id;
//!   },
//!   clearTimer: (id) => clearTimeout(id),
//!   // ... observeContainer/unobserveContainer and attachResizeListener
//!   // forward to observeSize and windowResized.
//! };
//! const rotator = new GridRotator(host, JSON.stringify({ step_duration_ms: 2000 }));
//! rotator.start();
//! ```
//!
//! Callbacks must be delivered asynchronously (from the browser's own queue),
//! never from inside a `GridHost` method. A `GridHost` method that throws is
//! caught at the boundary: measuring and wiring errors flow into the rotator's
//! own failure handling, anything else is logged and skipped.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{GridHost, GridRotator};

// Used by the wasm module and by native tests.
#[cfg(any(target_arch = "wasm32", test))]
mod rotator_core;
