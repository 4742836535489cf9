use breakout_reveal_wasm::application::ChartSession;
use breakout_reveal_wasm::config::{AnimationTimings, EngineConfig};
use breakout_reveal_wasm::domain::animation::{AnimationPhase, RevealController, StartOutcome, TickOutcome};
use breakout_reveal_wasm::domain::chart::{ChartKind, DeviceClass};
use breakout_reveal_wasm::domain::events::{ChartEvent, ScrollTarget};
use breakout_reveal_wasm::domain::market_data::RawBar;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

fn raw_series(len: usize, base: f64) -> Vec<RawBar> {
    (0..len)
        .map(|i| {
            let c = base + (i as f64 * 0.37).sin() * 3.0;
            let close = c + if i % 2 == 0 { 0.4 } else { -0.6 };
            let serde_json::Value::Object(map) =
                json!({"Open": c - 0.5, "High": c + 1.0, "Low": c - 1.5, "Close": close, "Volume": 1000 + i})
            else {
                unreachable!()
            };
            RawBar(map)
        })
        .collect()
}

fn started(outcome: StartOutcome) -> u64 {
    match outcome {
        StartOutcome::Started { generation } => generation,
        StartOutcome::Duplicate => panic!("run was not started"),
    }
}

/// Tick every `dt` ms until `until`, recording when each phase was entered
fn run(
    controller: &mut RevealController,
    generation: u64,
    from: f64,
    until: f64,
    dt: f64,
) -> Vec<(AnimationPhase, f64)> {
    let mut entered = Vec::new();
    let mut last = controller.phase();
    let mut now = from;
    while now <= until {
        controller.tick(generation, now);
        if controller.phase() != last {
            last = controller.phase();
            entered.push((last, now));
        }
        now += dt;
    }
    entered
}

#[test]
fn narrow_fifty_by_twenty_scenario() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let mut session = ChartSession::new(ChartKind::Daily, EngineConfig::default());
    let sink = events.clone();
    session.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    session.set_viewport(375.0, 420.0);
    session.load_series(&raw_series(50, 40.0), &raw_series(20, 44.0), 0.0);

    let generation = started(session.start_reveal(1, 0.0));

    assert_eq!(session.tick(generation, 1499.0), TickOutcome::Poll(50.0));
    assert_eq!(session.animation().phase, AnimationPhase::InitialDelay);
    assert_eq!(session.tick(generation, 1500.0), TickOutcome::Frame);
    assert_eq!(session.animation().phase, AnimationPhase::Zooming);

    session.tick(generation, 2250.0);
    let half_zoom = session.animation().zoom_progress;
    assert!(half_zoom > 50.0 && half_zoom < 100.0);

    session.tick(generation, 3000.0);
    assert_eq!(session.animation().zoom_progress, 100.0);
    assert_eq!(session.animation().phase, AnimationPhase::Revealing);

    session.tick(generation, 4800.0);
    assert_eq!(session.animation().reveal_progress, 100.0);
    assert_eq!(session.animation().phase, AnimationPhase::ObservationDelay);
    assert_eq!(session.frame().geometry.revealed_count, 20);

    assert_eq!(session.tick(generation, 9799.0), TickOutcome::Poll(50.0));
    assert_eq!(session.tick(generation, 9800.0), TickOutcome::Done);
    assert_eq!(session.animation().phase, AnimationPhase::Complete);
    assert_eq!(session.tick(generation, 12000.0), TickOutcome::Done);

    let events = events.borrow();
    let count = |wanted: &ChartEvent| events.iter().filter(|e| *e == wanted).count();
    assert_eq!(count(&ChartEvent::ObservationComplete), 1);
    assert_eq!(count(&ChartEvent::RevealStarted), 1);
    assert_eq!(count(&ChartEvent::RevealAnimationComplete), 1);
    assert_eq!(count(&ChartEvent::ScrollIntoView { target: ScrollTarget::HistoricalChart }), 1);
}

#[test]
fn wide_viewport_does_not_scroll() {
    let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
    let generation = started(c.start(1, true, 0.0));
    c.tick(generation, 20_000.0);
    assert_eq!(c.phase(), AnimationPhase::Complete);
    assert!(!c.drain_events().iter().any(|e| matches!(e, ChartEvent::ScrollIntoView { .. })));
}

#[test]
fn one_pause_extends_total_time_by_its_length() {
    let timings = AnimationTimings::default();
    let total = timings.total_ms(true);
    let mut c = RevealController::new(timings, DeviceClass::Wide);
    let generation = started(c.start(1, true, 0.0));

    run(&mut c, generation, 0.0, 2000.0, 16.0);
    assert!(c.pause(2000.0));
    assert_eq!(c.tick(generation, 2500.0), TickOutcome::Poll(50.0));
    assert!(c.resume(2700.0));
    assert!(!c.resume(2800.0));

    c.tick(generation, total + 700.0 - 1.0);
    assert_ne!(c.phase(), AnimationPhase::Complete);
    c.tick(generation, total + 700.0);
    assert_eq!(c.phase(), AnimationPhase::Complete);

    let pauses: Vec<_> =
        c.drain_events().into_iter().filter(|e| matches!(e, ChartEvent::PauseStateChanged { .. })).collect();
    assert_eq!(
        pauses,
        vec![ChartEvent::PauseStateChanged { paused: true }, ChartEvent::PauseStateChanged { paused: false }]
    );
}

#[test]
fn tick_granularity_does_not_shift_phase_boundaries() {
    for dt in [7.0, 16.0, 33.0, 250.0] {
        let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
        let generation = started(c.start(1, true, 0.0));
        c.tick(generation, 0.0);
        c.tick(generation, 10_000.0);
        assert_eq!(c.phase(), AnimationPhase::Complete, "dt {}", dt);

        let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
        let generation = started(c.start(1, true, 0.0));
        let entered = run(&mut c, generation, 0.0, 10_000.0, dt);
        let complete_at = entered.iter().find(|(p, _)| *p == AnimationPhase::Complete).map(|(_, t)| *t).unwrap();
        assert!(complete_at >= 9800.0 && complete_at < 9800.0 + dt, "dt {}: {}", dt, complete_at);
    }
}

#[test]
fn clearing_feedback_mid_zoom_stops_everything() {
    let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Narrow);
    let generation = started(c.start(1, true, 0.0));
    c.tick(generation, 2000.0);
    assert_eq!(c.phase(), AnimationPhase::Zooming);
    assert!(c.state().zoom_progress > 0.0);

    c.set_feedback(None, 2100.0);
    assert_eq!(c.phase(), AnimationPhase::Stopped);
    assert_eq!(c.state().zoom_progress, 0.0);
    assert_eq!(c.state().reveal_progress, 0.0);
    assert_eq!(c.tick(generation, 2200.0), TickOutcome::Stale);
}

#[test]
fn clearing_feedback_mid_reveal_stops_everything() {
    let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
    let generation = started(c.start(1, true, 0.0));
    c.tick(generation, 3500.0);
    assert_eq!(c.phase(), AnimationPhase::Revealing);

    c.set_feedback(None, 3600.0);
    assert_eq!(c.phase(), AnimationPhase::Stopped);
    assert_eq!(c.state().zoom_progress, 0.0);
    assert_eq!(c.state().reveal_progress, 0.0);
}

#[test]
fn no_future_data_settles_then_observes() {
    let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
    let generation = started(c.start(9, false, 0.0));
    c.tick(generation, 1500.0);
    assert_eq!(c.phase(), AnimationPhase::Settling);
    c.tick(generation, 2000.0);
    assert_eq!(c.phase(), AnimationPhase::ObservationDelay);
    assert!(c.drain_events().contains(&ChartEvent::RevealAnimationComplete));
    assert_eq!(c.tick(generation, 7000.0), TickOutcome::Done);
}

#[test]
fn new_token_restarts_with_fresh_generation() {
    let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
    c.set_has_future(true);
    let first = started(c.start(1, true, 0.0));
    let second = c.set_feedback(Some(2), 500.0).map(started).unwrap();
    assert!(second > first);
    assert_eq!(c.phase(), AnimationPhase::InitialDelay);
    assert_eq!(c.set_feedback(Some(2), 600.0), Some(StartOutcome::Duplicate));
}

#[test]
fn leaving_a_paused_run_reports_the_unpause() {
    let unpaused = ChartEvent::PauseStateChanged { paused: false };
    let paused_run = |token| {
        let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
        c.start(token, true, 0.0);
        assert!(c.pause(100.0));
        c.drain_events();
        c
    };

    let mut c = paused_run(1);
    c.reset(200.0);
    assert!(!c.state().is_paused());
    assert_eq!(c.drain_events(), vec![unpaused.clone(), ChartEvent::PhaseChanged { phase: AnimationPhase::Idle }]);

    let mut c = paused_run(1);
    c.stop(200.0);
    assert_eq!(c.drain_events(), vec![unpaused.clone(), ChartEvent::PhaseChanged { phase: AnimationPhase::Stopped }]);

    let mut c = paused_run(1);
    c.set_feedback(Some(2), 200.0);
    let events = c.drain_events();
    assert_eq!(events.first(), Some(&unpaused));
    assert!(events.contains(&ChartEvent::PhaseChanged { phase: AnimationPhase::InitialDelay }));

    // not paused: nothing extra
    let mut c = RevealController::new(AnimationTimings::default(), DeviceClass::Wide);
    c.start(1, true, 0.0);
    c.drain_events();
    c.reset(50.0);
    assert!(!c.drain_events().contains(&unpaused));
}
