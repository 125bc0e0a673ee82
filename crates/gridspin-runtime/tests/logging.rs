#![forbid(unsafe_code)]

//! What the animator reports through `tracing`.

use gridspin_harness::{SimHost, Simulation, layouts, with_captured_tracing};
use gridspin_runtime::AnimatorConfig;
use gridspin_runtime::animator::LOG_TARGET;
use tracing::Level;
use web_time::Duration;

fn portfolio() -> Simulation {
    Simulation::started(
        layouts::portfolio(),
        layouts::portfolio_container(),
        AnimatorConfig::default(),
    )
    .unwrap()
}

#[test]
fn healthy_run_logs_no_errors_or_warnings() {
    let (_, logs) = with_captured_tracing(|| {
        let mut sim = portfolio();
        sim.advance(Duration::from_secs(10));
    });
    assert!(logs.errors(LOG_TARGET).is_empty());
    assert!(logs.at_level(LOG_TARGET, Level::WARN).is_empty());
    assert_eq!(logs.at_level(LOG_TARGET, Level::INFO).len(), 1);
}

#[test]
fn steps_run_inside_a_span() {
    let (_, logs) = with_captured_tracing(|| {
        let mut sim = portfolio();
        sim.advance(Duration::from_millis(2_200));
    });
    let spans = logs.spans_named("gridspin.step");
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].fields["offset"], "0");
    assert_eq!(spans[1].fields["offset"], "1");
    assert_eq!(spans[0].fields["epoch"], "1");
}

#[test]
fn unexpected_failure_is_logged_as_error() {
    let (_, logs) = with_captured_tracing(|| {
        let mut sim = portfolio();
        sim.host_mut().fail_next_transition("TypeError: bad keyframe");
        sim.advance(Duration::from_millis(2_200));
    });
    let errors = logs.errors(LOG_TARGET);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "transition failed during step");
    assert_eq!(errors[0].fields["error"], "TypeError: bad keyframe");
    assert_eq!(errors[0].fields["offset"], "0");
}

#[test]
fn abort_is_not_an_error() {
    let (_, logs) = with_captured_tracing(|| {
        let mut sim = portfolio();
        sim.host_mut().abort_next_transition_of(0);
        sim.advance(Duration::from_secs(5));
    });
    assert!(logs.errors(LOG_TARGET).is_empty());
}

#[test]
fn resize_reset_is_not_an_error() {
    let (_, logs) = with_captured_tracing(|| {
        let mut sim = portfolio();
        sim.advance(Duration::from_millis(1_000));
        sim.resize_window(layouts::portfolio_container(), layouts::portfolio_narrow());
        sim.advance(Duration::from_secs(3));
    });
    assert!(logs.errors(LOG_TARGET).is_empty());
    let infos = logs.at_level(LOG_TARGET, Level::INFO);
    assert!(
        infos
            .iter()
            .any(|e| e.message == "resize: restarting rotation from offset 0")
    );
}

#[test]
fn setup_failure_is_logged_as_error() {
    let (_, logs) = with_captured_tracing(|| {
        let mut host = SimHost::new(layouts::portfolio(), layouts::portfolio_container());
        host.fail_observe("ResizeObserver is not defined");
        let mut sim = Simulation::new(host, AnimatorConfig::default()).unwrap();
        sim.animator_mut().start();
    });
    let errors = logs.errors(LOG_TARGET);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "grid rotation disabled");
}

#[test]
fn layout_not_ready_is_a_warning() {
    let (_, logs) = with_captured_tracing(|| {
        let mut sim = Simulation::started(
            layouts::collapsed(14),
            layouts::portfolio_container(),
            AnimatorConfig::default(),
        )
        .unwrap();
        sim.advance(Duration::from_millis(100));
    });
    let warnings = logs.at_level(LOG_TARGET, Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "layout not ready");
    assert!(logs.errors(LOG_TARGET).is_empty());
}

#[test]
fn partial_path_warns_at_construction() {
    let (_, logs) = with_captured_tracing(|| {
        let config = AnimatorConfig::default().with_path(vec![vec![0, 1, 2]]);
        Simulation::new(SimHost::new(layouts::portfolio(), layouts::portfolio_container()), config)
            .unwrap();
    });
    let warnings = logs.at_level(LOG_TARGET, Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields["path_len"], "3");
}

#[test]
fn path_beyond_grid_warns_at_construction() {
    let (_, logs) = with_captured_tracing(|| {
        let config = AnimatorConfig::default().with_path(vec![vec![0, 20]]);
        Simulation::new(SimHost::new(layouts::portfolio(), layouts::portfolio_container()), config)
            .unwrap();
    });
    let warnings = logs.at_level(LOG_TARGET, Level::WARN);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields["max_slot"], "20");
}
