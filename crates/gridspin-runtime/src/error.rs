#![forbid(unsafe_code)]

//! Error types.
//!
//! Only construction can fail from the caller's point of view. Everything that
//! goes wrong while the loop runs is absorbed by the animator: logged, written
//! to the [`Journal`](crate::Journal), and turned into a state change.

use gridspin_core::{PermutationError, Slot};

use crate::host::HostError;

/// Position capture found geometry that cannot be animated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutNotReady {
    /// The grid has no icons.
    #[error("grid has no icons to measure")]
    Empty,
    /// Every icon reports `(0, 0)`: layout has not run yet.
    #[error("every icon reports position (0, 0)")]
    AllZero,
    /// An icon reports a NaN or infinite coordinate.
    #[error("icon {icon} reports a non-finite position")]
    NotANumber { icon: Slot },
    /// The host could not reset or measure an icon.
    #[error("measuring icon {icon} failed: {source}")]
    Host {
        icon: Slot,
        #[source]
        source: HostError,
    },
}

/// The animator could not be constructed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimatorError {
    /// A rotation needs at least two icons.
    #[error("need at least 2 icons, found {count}")]
    TooFewIcons { count: usize },
    /// The configured path is not a valid permutation map.
    #[error("invalid rotation path: {0}")]
    Path(#[from] PermutationError),
    /// The configuration failed validation.
    #[error("invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),
}
