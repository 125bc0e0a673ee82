#![forbid(unsafe_code)]

//! Grid layouts for simulated hosts.

use gridspin_core::{Position, Size};

/// Inset of the first cell from the container's corner.
const MARGIN: f64 = 24.0;

/// `rows × cols` cells of side `cell`, row-major.
#[must_use]
pub fn grid(cols: usize, rows: usize, cell: f64) -> Vec<Position> {
    (0..rows * cols)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            Position::new(MARGIN + col as f64 * cell, MARGIN + row as f64 * cell)
        })
        .collect()
}

/// Container that fits [`grid`] with the same arguments.
#[must_use]
pub fn container_for(cols: usize, rows: usize, cell: f64) -> Size {
    Size::new(
        2.0 * MARGIN + cols as f64 * cell,
        2.0 * MARGIN + rows as f64 * cell,
    )
}

/// The portfolio grid: two rows of seven 96-unit cells.
#[must_use]
pub fn portfolio() -> Vec<Position> {
    grid(7, 2, 96.0)
}

/// Container of [`portfolio`].
#[must_use]
pub fn portfolio_container() -> Size {
    container_for(7, 2, 96.0)
}

/// The portfolio grid reflowed for a narrower window.
#[must_use]
pub fn portfolio_narrow() -> Vec<Position> {
    grid(7, 2, 64.0)
}

/// `n` icons that have not been laid out yet.
#[must_use]
pub fn collapsed(n: usize) -> Vec<Position> {
    vec![Position::default(); n]
}
