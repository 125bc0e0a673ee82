#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! Coordinates are layout units (CSS pixels in the browser), relative to the
//! icon's offset parent. They are floating point because layout engines report
//! fractional positions and because a host may hand back NaN when an element
//! has not been laid out yet.

use std::ops::Sub;

/// Layout position of a slot: the natural `(left, top)` of an icon with no
/// visual offset applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Distance from the left edge of the offset parent.
    pub left: f64,
    /// Distance from the top edge of the offset parent.
    pub top: f64,
}

impl Position {
    /// Create a new position.
    #[inline]
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }

    /// True when both coordinates are exactly zero.
    ///
    /// A grid where every icon reports the origin has not been laid out.
    #[inline]
    pub fn is_origin(&self) -> bool {
        self.left == 0.0 && self.top == 0.0
    }

    /// True when neither coordinate is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite()
    }
}

impl Sub for Position {
    type Output = Offset;

    fn sub(self, rhs: Self) -> Offset {
        Offset {
            dx: self.left - rhs.left,
            dy: self.top - rhs.top,
        }
    }
}

/// A visual translation applied on top of an icon's natural position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    /// Horizontal translation.
    pub dx: f64,
    /// Vertical translation.
    pub dy: f64,
}

impl Offset {
    /// The identity translation.
    pub const ZERO: Self = Self { dx: 0.0, dy: 0.0 };

    /// Create a new offset.
    #[inline]
    pub const fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    /// True when neither component is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite()
    }

    /// True when the movement from `self` to `other` reaches `threshold` on at
    /// least one axis.
    #[inline]
    pub fn moves_to(&self, other: Offset, threshold: f64) -> bool {
        (self.dx - other.dx).abs() >= threshold || (self.dy - other.dy).abs() >= threshold
    }

    /// Linear interpolation between `self` and `to` at progress `t`.
    #[inline]
    pub fn lerp(&self, to: Offset, t: f64) -> Offset {
        Offset {
            dx: self.dx + (to.dx - self.dx) * t,
            dy: self.dy + (to.dy - self.dy) * t,
        }
    }
}

/// Observed size of the grid container.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True unless both dimensions are strictly positive.
    ///
    /// NaN dimensions count as empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_difference_is_offset() {
        let a = Position::new(120.0, 40.0);
        let b = Position::new(20.0, 50.0);
        assert_eq!(a - b, Offset::new(100.0, -10.0));
    }

    #[test]
    fn origin_detection() {
        assert!(Position::new(0.0, 0.0).is_origin());
        assert!(!Position::new(0.0, 0.5).is_origin());
        assert!(!Position::new(f64::NAN, 0.0).is_origin());
    }

    #[test]
    fn nan_is_not_finite() {
        assert!(!Position::new(f64::NAN, 1.0).is_finite());
        assert!(!Offset::new(1.0, f64::INFINITY).is_finite());
        assert!(Offset::new(-3.0, 2.0).is_finite());
    }

    #[test]
    fn movement_threshold_is_per_axis() {
        let from = Offset::new(10.0, 10.0);
        assert!(!from.moves_to(Offset::new(10.5, 10.9), 1.0));
        assert!(from.moves_to(Offset::new(11.0, 10.0), 1.0));
        assert!(from.moves_to(Offset::new(10.0, 8.5), 1.0));
    }

    #[test]
    fn lerp_endpoints() {
        let a = Offset::new(0.0, 100.0);
        let b = Offset::new(50.0, 0.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Offset::new(25.0, 50.0));
    }

    #[test]
    fn size_emptiness() {
        assert!(Size::new(0.0, 0.0).is_empty());
        assert!(Size::new(300.0, 0.0).is_empty());
        assert!(Size::new(f64::NAN, 20.0).is_empty());
        assert!(!Size::new(300.0, 200.0).is_empty());
    }
}
