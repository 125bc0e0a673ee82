#![forbid(unsafe_code)]

//! Two-keyframe offset transitions.
//!
//! A [`TransitionSpec`] moves one icon's visual offset from `from` to `to`
//! over `duration`. Offsets are relative to the icon's own natural position,
//! so `Offset::ZERO` means "where the layout put it".
//!
//! Transitions never persist their final keyframe (CSS `fill: none`): once
//! finished the icon snaps back to its natural position, and the next step
//! recomputes both keyframes from the captured slot positions. Nothing is
//! accumulated across steps, so rounding never drifts.

use std::time::Duration;

use crate::easing::Easing;
use crate::geometry::Offset;
use crate::permutation::Slot;

/// One icon's animation for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionSpec {
    /// Icon being moved (its original slot).
    pub icon: Slot,
    /// Offset at the first keyframe.
    pub from: Offset,
    /// Offset at the last keyframe.
    pub to: Offset,
    /// Wall-clock length of the transition.
    pub duration: Duration,
    /// Timing curve.
    pub easing: Easing,
}

impl TransitionSpec {
    /// Offset at `elapsed` time into the transition.
    ///
    /// Returns `to` at or after the end. A zero duration jumps straight to `to`.
    #[must_use]
    pub fn sample(&self, elapsed: Duration) -> Offset {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.lerp(self.to, self.easing.apply(t))
    }

    /// The two CSS `transform` keyframe values.
    #[must_use]
    pub fn css_keyframes(&self) -> [String; 2] {
        [translate(self.from), translate(self.to)]
    }

    /// Duration in milliseconds, fractional part kept, as handed to
    /// `Element.animate`.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}

fn translate(offset: Offset) -> String {
    format!("translate({}px, {}px)", offset.dx, offset.dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TransitionSpec {
        TransitionSpec {
            icon: 3,
            from: Offset::new(0.0, 0.0),
            to: Offset::new(100.0, -40.0),
            duration: Duration::from_millis(2000),
            easing: Easing::Linear,
        }
    }

    #[test]
    fn sample_interpolates_and_ends_at_target() {
        let s = spec();
        assert_eq!(s.sample(Duration::ZERO), s.from);
        assert_eq!(s.sample(Duration::from_millis(1000)), Offset::new(50.0, -20.0));
        assert_eq!(s.sample(Duration::from_millis(2000)), s.to);
        assert_eq!(s.sample(Duration::from_secs(60)), s.to);
    }

    #[test]
    fn zero_duration_jumps() {
        let s = TransitionSpec {
            duration: Duration::ZERO,
            ..spec()
        };
        assert_eq!(s.sample(Duration::ZERO), s.to);
    }

    #[test]
    fn eased_sample_lags_linear_early() {
        let s = TransitionSpec {
            easing: Easing::EaseInOut,
            ..spec()
        };
        let early = s.sample(Duration::from_millis(200));
        assert!(early.dx < 10.0, "dx = {}", early.dx);
    }

    #[test]
    fn css_keyframes_use_pixels() {
        let [from, to] = spec().css_keyframes();
        assert_eq!(from, "translate(0px, 0px)");
        assert_eq!(to, "translate(100px, -40px)");
        assert_eq!(spec().duration_ms(), 2000.0);
        let short = TransitionSpec {
            duration: Duration::from_micros(2_500),
            ..spec()
        };
        assert_eq!(short.duration_ms(), 2.5);
    }
}
