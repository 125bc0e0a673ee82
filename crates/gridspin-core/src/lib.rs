#![forbid(unsafe_code)]

//! Core: geometry, permutation paths, easing, and transition descriptions.
//!
//! # Role in gridspin
//! `gridspin-core` is the pure layer. It knows nothing about hosts, timers,
//! or logging; it answers two questions for the runtime:
//!
//! - **Where does an icon go?** [`PermutationMap::follow`] walks the rotation
//!   path a number of steps from an icon's original slot.
//! - **How does it get there?** [`TransitionSpec`] describes one two-keyframe
//!   offset animation with an [`Easing`] curve.
//!
//! # How it fits in the system
//! The runtime (`gridspin-runtime`) captures slot positions from a host,
//! combines them with the permutation map and the global offset, and hands
//! the resulting [`TransitionSpec`] values back to the host to animate.

pub mod easing;
pub mod geometry;
pub mod permutation;
pub mod transition;

pub use easing::Easing;
pub use geometry::{Offset, Position, Size};
pub use permutation::{PermutationError, PermutationMap, Slot};
pub use transition::TransitionSpec;
