//! Browser-side clock for the reveal timeline.
//!
//! The driver owns one async loop per run. Each iteration calls the step
//! closure with the generation it was spawned for and waits for whatever
//! cadence the step asks for: the next animation frame, or a timeout.
//! Dropping the driver aborts the loop, which drops (and so cancels) the
//! pending frame request or timeout.

use crate::domain::animation::TickOutcome;
use crate::domain::logging::LogComponent;
use crate::infrastructure::services::now_ms;
use crate::{log_debug, log_trace};
use futures::channel::oneshot;
use futures::future::{AbortHandle, Abortable};
use gloo::render::request_animation_frame;
use gloo_timers::future::TimeoutFuture;
use wasm_bindgen_futures::spawn_local;

/// Resolves on the next `requestAnimationFrame` with its timestamp
async fn next_frame() -> Option<f64> {
    let (tx, rx) = oneshot::channel();
    let _frame = request_animation_frame(move |ts| {
        let _ = tx.send(ts);
    });
    rx.await.ok()
}

pub struct AnimationDriver {
    generation: u64,
    abort: AbortHandle,
}

impl AnimationDriver {
    /// Start driving `step` for `generation` on the browser event loop
    pub fn spawn<F>(generation: u64, mut step: F) -> Self
    where
        F: FnMut(u64, f64) -> TickOutcome + 'static,
    {
        let (abort, registration) = AbortHandle::new_pair();
        let run = async move {
            loop {
                match step(generation, now_ms()) {
                    TickOutcome::Frame => {
                        if next_frame().await.is_none() {
                            break;
                        }
                    }
                    TickOutcome::Poll(ms) => TimeoutFuture::new(ms.max(0.0).round() as u32).await,
                    TickOutcome::Done => {
                        log_debug!(LogComponent::Infrastructure("AnimationDriver"), "generation {} done", generation);
                        break;
                    }
                    TickOutcome::Stale => {
                        log_trace!(
                            LogComponent::Infrastructure("AnimationDriver"),
                            "generation {} superseded",
                            generation
                        );
                        break;
                    }
                }
            }
        };
        spawn_local(async move {
            let _ = Abortable::new(run, registration).await;
        });
        Self { generation, abort }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }

    pub fn cancel(&self) {
        self.abort.abort();
    }
}

impl Drop for AnimationDriver {
    fn drop(&mut self) {
        self.abort.abort();
    }
}
