#![forbid(unsafe_code)]

//! Position capture against the simulated page.

use gridspin_core::{Position, Size};
use gridspin_harness::{SimHost, layouts};
use gridspin_runtime::{LayoutNotReady, SlotPositions, capture_positions};

fn host(layout: Vec<Position>) -> SimHost {
    SimHost::new(layout, Size::new(800.0, 300.0))
}

#[test]
fn captures_every_slot_in_order() {
    let mut h = host(layouts::portfolio());
    let positions = capture_positions(&mut h).unwrap();
    assert_eq!(positions, layouts::portfolio());
}

#[test]
fn clears_offsets_before_reading() {
    let mut h = host(layouts::portfolio());
    capture_positions(&mut h).unwrap();
    assert_eq!(h.cleared_offsets(), 14);
}

#[test]
fn empty_grid_is_not_ready() {
    let mut h = host(Vec::new());
    assert_eq!(capture_positions(&mut h), Err(LayoutNotReady::Empty));
}

#[test]
fn all_origin_is_not_ready() {
    let mut h = host(layouts::collapsed(14));
    assert_eq!(capture_positions(&mut h), Err(LayoutNotReady::AllZero));
}

#[test]
fn one_icon_at_origin_is_fine() {
    let mut layout = layouts::portfolio();
    layout[0] = Position::default();
    let mut h = host(layout.clone());
    assert_eq!(capture_positions(&mut h), Ok(layout));
}

#[test]
fn non_finite_coordinate_is_not_ready() {
    let mut layout = layouts::portfolio();
    layout[9] = Position::new(f64::NAN, 120.0);
    let mut h = host(layout);
    assert_eq!(
        capture_positions(&mut h),
        Err(LayoutNotReady::NotANumber { icon: 9 })
    );

    let mut layout = layouts::portfolio();
    layout[2] = Position::new(0.0, f64::INFINITY);
    let mut h = host(layout);
    assert_eq!(
        capture_positions(&mut h),
        Err(LayoutNotReady::NotANumber { icon: 2 })
    );
}

#[test]
fn host_failure_names_the_icon() {
    let mut h = host(layouts::portfolio());
    h.set_unmeasurable(Some(4));
    let err = capture_positions(&mut h).unwrap_err();
    assert!(matches!(err, LayoutNotReady::Host { icon: 4, .. }), "{err}");
    assert_eq!(err.to_string(), "measuring icon 4 failed: icon 4 is detached");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn snapshot_accessors() {
    let snapshot = SlotPositions::new(3, layouts::portfolio());
    assert_eq!(snapshot.epoch(), 3);
    assert_eq!(snapshot.len(), 14);
    assert_eq!(snapshot[7], Position::new(24.0, 120.0));
    assert_eq!(snapshot.get(14), None);
    assert!(!snapshot.is_degenerate());
    assert!(SlotPositions::new(1, layouts::collapsed(2)).is_degenerate());
}

#[test]
fn offset_reset_failure_stops_the_capture() {
    let mut h = host(layouts::portfolio());
    h.set_uncleared(Some(6));
    let err = capture_positions(&mut h).unwrap_err();
    assert!(matches!(err, LayoutNotReady::Host { icon: 6, .. }), "{err}");
    assert_eq!(err.to_string(), "measuring icon 6 failed: icon 6 style is read-only");
    assert_eq!(h.cleared_offsets(), 6);
}
