#![forbid(unsafe_code)]

//! Position oracle: snapshot every slot's layout position.
//!
//! Positions are read with all visual offsets cleared, so they describe where
//! the layout engine placed each icon, not where an animation happens to be
//! drawing it. A snapshot is tagged with the layout epoch it was taken in and
//! is discarded when that epoch ends.

use std::ops::Index;

use gridspin_core::{Position, Slot};

use crate::error::LayoutNotReady;
use crate::host::Host;

/// Slot positions captured during one layout epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPositions {
    epoch: u64,
    positions: Vec<Position>,
}

impl SlotPositions {
    /// Wrap positions captured in `epoch`.
    #[must_use]
    pub fn new(epoch: u64, positions: Vec<Position>) -> Self {
        Self { epoch, positions }
    }

    /// Layout epoch these positions belong to.
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of `slot`, if it was captured.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: Slot) -> Option<Position> {
        self.positions.get(slot).copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Position] {
        &self.positions
    }

    /// True when every position is the origin (layout never ran).
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        all_origin(&self.positions)
    }
}

impl Index<Slot> for SlotPositions {
    type Output = Position;

    fn index(&self, slot: Slot) -> &Position {
        &self.positions[slot]
    }
}

/// Clear each icon's offset and read its natural position.
///
/// Fails if the grid is empty, the host cannot reset or measure an icon, any
/// coordinate is not finite, or every icon sits at `(0, 0)`.
pub fn capture_positions<H: Host + ?Sized>(host: &mut H) -> Result<Vec<Position>, LayoutNotReady> {
    let count = host.icon_count();
    if count == 0 {
        return Err(LayoutNotReady::Empty);
    }

    for icon in 0..count {
        host.clear_offset(icon)
            .map_err(|source| LayoutNotReady::Host { icon, source })?;
    }

    let mut positions = Vec::with_capacity(count);
    for icon in 0..count {
        let pos = host
            .layout_position(icon)
            .map_err(|source| LayoutNotReady::Host { icon, source })?;
        positions.push(pos);
    }

    if all_origin(&positions) {
        return Err(LayoutNotReady::AllZero);
    }
    if let Some(icon) = positions.iter().position(|p| !p.is_finite()) {
        return Err(LayoutNotReady::NotANumber { icon });
    }
    Ok(positions)
}

fn all_origin(positions: &[Position]) -> bool {
    !positions.is_empty() && positions.iter().all(Position::is_origin)
}
