//! Reveal timeline for one card.
//!
//! The controller never reads a clock: every entry point takes `now` in
//! milliseconds, and the caller schedules the next tick according to the
//! returned [`TickOutcome`]. Each scheduled tick carries the generation it
//! was created for; anything that resets the timeline bumps the generation,
//! so late callbacks from an older run fall through as [`TickOutcome::Stale`].

use super::state::{AnimationPhase, AnimationState, ease_out_cubic};
use crate::config::AnimationTimings;
use crate::domain::chart::value_objects::DeviceClass;
use crate::domain::errors::ChartError;
use crate::domain::events::{ChartEvent, ScrollTarget};
use crate::domain::logging::LogComponent;
use crate::{log_debug, log_info, log_trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { generation: u64 },
    /// Same feedback token as the run already in progress
    Duplicate,
}

/// What the caller should schedule next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Redraw on the next animation frame
    Frame,
    /// Check again after this many milliseconds
    Poll(f64),
    Done,
    /// Tick belonged to an older generation and was ignored
    Stale,
}

#[derive(Debug, Clone)]
pub struct RevealController {
    timings: AnimationTimings,
    device: DeviceClass,
    state: AnimationState,
    token: Option<u64>,
    has_future: bool,
    outbox: Vec<ChartEvent>,
}

impl RevealController {
    pub fn new(timings: AnimationTimings, device: DeviceClass) -> Self {
        Self {
            timings,
            device,
            state: AnimationState::default(),
            token: None,
            has_future: false,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn phase(&self) -> AnimationPhase {
        self.state.phase
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn token(&self) -> Option<u64> {
        self.token
    }

    pub fn set_device(&mut self, device: DeviceClass) {
        self.device = device;
    }

    /// Used by [`Self::set_feedback`] when it starts a run
    pub fn set_has_future(&mut self, has_future: bool) {
        self.has_future = has_future;
    }

    /// Events produced since the last call
    pub fn drain_events(&mut self) -> Vec<ChartEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn start(&mut self, token: u64, has_future: bool, now: f64) -> StartOutcome {
        if self.token == Some(token) {
            log_debug!(LogComponent::Domain("RevealController"), "feedback {} already started", token);
            return StartOutcome::Duplicate;
        }
        self.clear(now);
        self.token = Some(token);
        self.has_future = has_future;
        self.enter(AnimationPhase::InitialDelay);
        log_info!(
            LogComponent::Domain("RevealController"),
            "run {} started (generation {}, future: {})",
            token,
            self.state.generation,
            has_future
        );
        StartOutcome::Started { generation: self.state.generation }
    }

    /// `None` stops the run outright; a new token restarts it
    pub fn set_feedback(&mut self, token: Option<u64>, now: f64) -> Option<StartOutcome> {
        match token {
            None => {
                self.stop(now);
                None
            }
            Some(token) => Some(self.start(token, self.has_future, now)),
        }
    }

    /// Zero progress and invalidate scheduled ticks; back to `Idle`
    pub fn reset(&mut self, now: f64) {
        self.clear(now);
        self.token = None;
        if self.state.phase != AnimationPhase::Idle {
            self.enter(AnimationPhase::Idle);
        }
    }

    pub fn stop(&mut self, now: f64) {
        let was = self.state.phase;
        self.clear(now);
        self.token = None;
        if was != AnimationPhase::Stopped {
            self.enter(AnimationPhase::Stopped);
        }
    }

    fn clear(&mut self, now: f64) {
        if self.state.is_paused() {
            self.outbox.push(ChartEvent::PauseStateChanged { paused: false });
        }
        let generation = self.state.generation + 1;
        let phase = self.state.phase;
        self.state = AnimationState { phase, phase_started_at: now, generation, ..AnimationState::default() };
    }

    pub fn pause(&mut self, now: f64) -> bool {
        if !self.state.phase.is_running() || self.state.is_paused() {
            return false;
        }
        self.state.pause_started_at = Some(now);
        self.outbox.push(ChartEvent::PauseStateChanged { paused: true });
        true
    }

    pub fn resume(&mut self, now: f64) -> bool {
        let Some(started) = self.state.pause_started_at.take() else {
            return false;
        };
        self.state.paused_accumulated_ms += (now - started).max(0.0);
        self.outbox.push(ChartEvent::PauseStateChanged { paused: false });
        true
    }

    pub fn tick(&mut self, generation: u64, now: f64) -> TickOutcome {
        if generation != self.state.generation {
            let err = ChartError::StaleAnimationTick { scheduled: generation, current: self.state.generation };
            log_trace!(LogComponent::Domain("RevealController"), "{}", err);
            return TickOutcome::Stale;
        }
        if !self.state.phase.is_running() {
            return TickOutcome::Done;
        }
        if self.state.is_paused() {
            return TickOutcome::Poll(self.timings.poll_interval_ms);
        }

        while let Some(duration) = self.state.phase.duration_ms(&self.timings) {
            let elapsed = self.state.phase_elapsed(now);
            let progress = if duration > 0.0 { (elapsed / duration).min(1.0) } else { 1.0 };
            self.apply_progress(progress);
            if elapsed < duration {
                break;
            }

            // Leftover time flows into the next phase
            self.state.phase_started_at += duration + self.state.paused_accumulated_ms;
            self.state.paused_accumulated_ms = 0.0;
            match self.state.phase.next(self.has_future) {
                Some(next) => self.enter(next),
                None => break,
            }
        }

        match self.state.phase {
            AnimationPhase::Zooming | AnimationPhase::Revealing => TickOutcome::Frame,
            phase if phase.is_running() => TickOutcome::Poll(self.timings.poll_interval_ms),
            _ => TickOutcome::Done,
        }
    }

    fn apply_progress(&mut self, progress: f64) {
        match self.state.phase {
            AnimationPhase::Zooming => self.state.zoom_progress = ease_out_cubic(progress) * 100.0,
            AnimationPhase::Revealing => self.state.reveal_progress = ease_out_cubic(progress) * 100.0,
            _ => {}
        }
    }

    fn enter(&mut self, phase: AnimationPhase) {
        self.state.phase = phase;
        if phase == AnimationPhase::Revealing {
            self.state.zoom_progress = 100.0;
        }
        if phase == AnimationPhase::ObservationDelay && self.has_future {
            self.state.reveal_progress = 100.0;
        }
        self.outbox.push(ChartEvent::PhaseChanged { phase });
        match phase {
            AnimationPhase::Revealing => self.outbox.push(ChartEvent::RevealStarted),
            AnimationPhase::ObservationDelay => self.outbox.push(ChartEvent::RevealAnimationComplete),
            AnimationPhase::Complete => {
                self.outbox.push(ChartEvent::ObservationComplete);
                if self.device == DeviceClass::Narrow {
                    self.outbox.push(ChartEvent::ScrollIntoView { target: ScrollTarget::HistoricalChart });
                }
            }
            _ => {}
        }
    }
}
