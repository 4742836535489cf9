#![cfg(feature = "render")]

use breakout_reveal_wasm::domain::animation::TickOutcome;
use breakout_reveal_wasm::infrastructure::scheduler::AnimationDriver;
use gloo_timers::future::sleep;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test(async)]
async fn driver_polls_until_done() {
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let driver = AnimationDriver::spawn(3, move |generation, _now| {
        assert_eq!(generation, 3);
        counter.set(counter.get() + 1);
        if counter.get() < 3 { TickOutcome::Poll(5.0) } else { TickOutcome::Done }
    });

    sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.get(), 3);
    assert_eq!(driver.generation(), 3);
}

#[wasm_bindgen_test(async)]
async fn dropping_the_driver_cancels_pending_ticks() {
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let driver = AnimationDriver::spawn(1, move |_, _| {
        counter.set(counter.get() + 1);
        TickOutcome::Poll(20.0)
    });

    sleep(Duration::from_millis(5)).await;
    let seen = calls.get();
    drop(driver);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.get(), seen);
}

#[wasm_bindgen_test(async)]
async fn frame_cadence_uses_animation_frames() {
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let driver = AnimationDriver::spawn(7, move |_, _| {
        counter.set(counter.get() + 1);
        if counter.get() < 4 { TickOutcome::Frame } else { TickOutcome::Stale }
    });

    sleep(Duration::from_millis(300)).await;
    assert_eq!(calls.get(), 4);
    assert!(!driver.is_cancelled());
}
