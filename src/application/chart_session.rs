//! One practice card: its two series, viewport, reveal timeline and pointer
//! state, with every outgoing event routed through one dispatcher.

use crate::config::EngineConfig;
use crate::domain::animation::{AnimationState, RevealController, StartOutcome, TickOutcome};
use crate::domain::chart::{
    ChartGeometry, ChartKind, ChartScales, ChartViewport, ClickOutcome, CursorStyle, ElementBounds, Gesture,
    PointerPosition, PointerTracker, ScaleRequest, Selection, build_geometry, compute_scales, map_chart_point,
    map_click, revealed_count, to_chart_local,
};
use crate::domain::errors::{ChartResult, RejectReason};
use crate::domain::events::{ChartEvent, EventDispatcher, InMemoryEventDispatcher};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    MAX_GREEN_RATIO, NormalizedBar, RawBar, SeriesSummary, candle_distribution_ok, parse_series_payload,
    prepare_series,
};
use crate::{log_debug, log_info, log_warn};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub scales: ChartScales,
    pub geometry: ChartGeometry,
    pub animation: AnimationState,
}

pub struct ChartSession {
    config: EngineConfig,
    kind: ChartKind,
    viewport: ChartViewport,
    historical: Vec<NormalizedBar>,
    future: Vec<NormalizedBar>,
    summary: SeriesSummary,
    series_generation: u64,
    selection_enabled: bool,
    controller: RevealController,
    tracker: PointerTracker,
    dispatcher: InMemoryEventDispatcher,
    last_selection: Option<Selection>,
    cached_hash: u64,
    cached_frame: Option<FrameSnapshot>,
    cache_hits: usize,
}

impl ChartSession {
    pub fn new(kind: ChartKind, config: EngineConfig) -> Self {
        let viewport = ChartViewport::default();
        Self {
            controller: RevealController::new(config.timings, viewport.device),
            config,
            kind,
            viewport,
            historical: Vec::new(),
            future: Vec::new(),
            summary: SeriesSummary::default(),
            series_generation: 0,
            selection_enabled: true,
            tracker: PointerTracker::new(true),
            dispatcher: InMemoryEventDispatcher::new(),
            last_selection: None,
            cached_hash: 0,
            cached_frame: None,
            cache_hits: 0,
        }
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&ChartEvent) + 'static,
    {
        self.dispatcher.subscribe_to_chart_events(handler);
    }

    /// Replace both series. Any run in progress is reset.
    pub fn load_series(&mut self, historical: &[RawBar], future: &[RawBar], now: f64) {
        let (historical, future) = prepare_series(historical, future, self.kind);
        if !candle_distribution_ok(&historical, MAX_GREEN_RATIO) {
            log_warn!(
                LogComponent::Application("ChartSession"),
                "more than {:.0}% green candles, data may be skewed",
                MAX_GREEN_RATIO * 100.0
            );
        }
        self.summary = SeriesSummary::from_series(&historical, &future);
        self.historical = historical;
        self.future = future;
        self.series_generation += 1;
        self.last_selection = None;
        self.tracker.cancel();
        self.controller.reset(now);
        self.controller.set_has_future(!self.future.is_empty());
        self.flush_events();
        log_info!(
            LogComponent::Application("ChartSession"),
            "{} chart loaded: {} historical, {} future ({} drawable)",
            self.kind,
            self.historical.len(),
            self.future.len(),
            self.summary.valid_bars
        );
    }

    /// [`Self::load_series`] from two JSON array payloads
    pub fn load_series_json(&mut self, historical: &str, future: &str, now: f64) -> ChartResult<()> {
        let historical = parse_series_payload(historical)?;
        let future = parse_series_payload(future)?;
        self.load_series(&historical, &future, now);
        Ok(())
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        let device = self.config.layout.device_for_width(width);
        self.viewport = ChartViewport::new(width, height, device);
        self.controller.set_device(device);
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
        self.tracker.set_selection_enabled(enabled);
    }

    pub fn start_reveal(&mut self, token: u64, now: f64) -> StartOutcome {
        let outcome = self.controller.start(token, !self.future.is_empty(), now);
        self.flush_events();
        outcome
    }

    pub fn set_feedback(&mut self, token: Option<u64>, now: f64) -> Option<StartOutcome> {
        let outcome = self.controller.set_feedback(token, now);
        self.flush_events();
        outcome
    }

    pub fn tick(&mut self, generation: u64, now: f64) -> TickOutcome {
        let outcome = self.controller.tick(generation, now);
        self.flush_events();
        outcome
    }

    pub fn pause(&mut self, now: f64) -> bool {
        let changed = self.controller.pause(now);
        self.flush_events();
        changed
    }

    pub fn resume(&mut self, now: f64) -> bool {
        let changed = self.controller.resume(now);
        self.flush_events();
        changed
    }

    pub fn reset(&mut self, now: f64) {
        self.controller.reset(now);
        self.last_selection = None;
        self.flush_events();
    }

    fn flush_events(&mut self) {
        for event in self.controller.drain_events() {
            self.dispatcher.publish_chart_event(event);
        }
    }

    fn scale_request(&self) -> ScaleRequest {
        let animation = self.controller.state();
        ScaleRequest {
            revealed_count: revealed_count(self.future.len(), animation.reveal_progress),
            zoom_progress: animation.zoom_progress,
            viewport: self.viewport,
            kind: self.kind,
            allow_extension: self.selection_enabled,
        }
    }

    fn input_hash(&self) -> u64 {
        let animation = self.controller.state();
        let mut hasher = DefaultHasher::new();
        self.series_generation.hash(&mut hasher);
        self.viewport.width.to_bits().hash(&mut hasher);
        self.viewport.height.to_bits().hash(&mut hasher);
        self.viewport.device.hash(&mut hasher);
        self.kind.hash(&mut hasher);
        self.selection_enabled.hash(&mut hasher);
        animation.phase.hash(&mut hasher);
        animation.zoom_progress.to_bits().hash(&mut hasher);
        animation.reveal_progress.to_bits().hash(&mut hasher);
        animation.is_paused().hash(&mut hasher);
        hasher.finish()
    }

    pub fn scales(&self) -> ChartScales {
        compute_scales(
            &self.historical,
            &self.future,
            &self.scale_request(),
            &self.config.layout,
            &self.config.solver,
        )
    }

    /// Scales, geometry and animation state; recomputed only when an input changed
    pub fn frame(&mut self) -> FrameSnapshot {
        let hash = self.input_hash();
        if let Some(frame) = &self.cached_frame
            && hash == self.cached_hash
        {
            self.cache_hits += 1;
            return frame.clone();
        }

        let request = self.scale_request();
        let scales = self.scales();
        let geometry = build_geometry(
            &self.historical,
            &self.future,
            request.revealed_count,
            self.controller.state().reveal_progress,
            &scales,
            self.kind,
        );
        let frame = FrameSnapshot { scales, geometry, animation: *self.controller.state() };
        self.cached_hash = hash;
        self.cached_frame = Some(frame.clone());
        frame
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits
    }

    /// Map a click in client coordinates and publish a selection if it lands
    pub fn handle_click(&mut self, pointer: PointerPosition, bounds: ElementBounds) -> ClickOutcome {
        let scales = self.frame().scales;
        let outcome = map_click(pointer, bounds, &scales, self.historical.len(), self.selection_enabled);
        self.accept(outcome)
    }

    pub fn pointer_down(&mut self, pointer: PointerPosition, bounds: ElementBounds) {
        let scales = self.frame().scales;
        let (x, y) = to_chart_local(pointer, bounds, &scales.margins);
        self.tracker.pointer_down(x, y, &scales);
    }

    pub fn pointer_move(&mut self, pointer: PointerPosition, bounds: ElementBounds) -> CursorStyle {
        let scales = self.frame().scales;
        let (x, y) = to_chart_local(pointer, bounds, &scales.margins);
        self.tracker.pointer_move(x, y, &scales)
    }

    /// End of a gesture; only a tap in the selectable region selects
    pub fn pointer_up(&mut self, pointer: PointerPosition, bounds: ElementBounds) -> ClickOutcome {
        let scales = self.frame().scales;
        let (x, y) = to_chart_local(pointer, bounds, &scales.margins);
        match self.tracker.pointer_up(x, y) {
            Gesture::Tap => {
                let outcome = map_chart_point(x, y, &scales, self.historical.len());
                self.accept(outcome)
            }
            Gesture::Pan | Gesture::Ignored => {
                log_debug!(LogComponent::Application("ChartSession"), "gesture at ({:.1}, {:.1}) not a click", x, y);
                ClickOutcome::Rejected { reason: RejectReason::NotAClick }
            }
        }
    }

    fn accept(&mut self, outcome: ClickOutcome) -> ClickOutcome {
        if let ClickOutcome::Selected { selection } = outcome {
            self.last_selection = Some(selection);
            self.dispatcher.publish_chart_event(ChartEvent::SelectionMade { selection });
        }
        outcome
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn viewport(&self) -> ChartViewport {
        self.viewport
    }

    pub fn animation(&self) -> &AnimationState {
        self.controller.state()
    }

    pub fn generation(&self) -> u64 {
        self.controller.generation()
    }

    pub fn historical(&self) -> &[NormalizedBar] {
        &self.historical
    }

    pub fn future(&self) -> &[NormalizedBar] {
        &self.future
    }

    pub fn summary(&self) -> &SeriesSummary {
        &self.summary
    }

    pub fn last_selection(&self) -> Option<Selection> {
        self.last_selection
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
