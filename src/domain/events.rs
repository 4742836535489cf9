use crate::domain::animation::AnimationPhase;
use crate::domain::chart::interaction::Selection;
use serde::Serialize;
use std::fmt::Debug;

/// Base trait for all domain events
pub trait DomainEvent: Debug + Clone {
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> u64 {
        use crate::domain::logging::get_time_provider;
        get_time_provider().current_timestamp()
    }
}

/// Element the host should bring into view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScrollTarget {
    HistoricalChart,
}

/// Everything the engine tells the outside world.
///
/// Listeners (caller callbacks, onboarding overlays) subscribe through an
/// [`EventDispatcher`]; the engine never knows who is listening.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChartEvent {
    SelectionMade { selection: Selection },
    PhaseChanged { phase: AnimationPhase },
    RevealStarted,
    /// Reveal finished visually; fires before the observation delay runs
    RevealAnimationComplete,
    ObservationComplete,
    PauseStateChanged { paused: bool },
    ScrollIntoView { target: ScrollTarget },
}

impl DomainEvent for ChartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ChartEvent::SelectionMade { .. } => "SelectionMade",
            ChartEvent::PhaseChanged { .. } => "PhaseChanged",
            ChartEvent::RevealStarted => "RevealStarted",
            ChartEvent::RevealAnimationComplete => "RevealAnimationComplete",
            ChartEvent::ObservationComplete => "ObservationComplete",
            ChartEvent::PauseStateChanged { .. } => "PauseStateChanged",
            ChartEvent::ScrollIntoView { .. } => "ScrollIntoView",
        }
    }
}

/// Event dispatcher for publishing events
pub trait EventDispatcher {
    fn publish_chart_event(&self, event: ChartEvent);
}

/// Simple in-memory event dispatcher
#[derive(Default)]
pub struct InMemoryEventDispatcher {
    chart_handlers: Vec<Box<dyn Fn(&ChartEvent)>>,
}

impl InMemoryEventDispatcher {
    pub fn new() -> Self {
        Self { chart_handlers: Vec::new() }
    }

    pub fn subscribe_to_chart_events<F>(&mut self, handler: F)
    where
        F: Fn(&ChartEvent) + 'static,
    {
        self.chart_handlers.push(Box::new(handler));
    }

    pub fn handler_count(&self) -> usize {
        self.chart_handlers.len()
    }
}

impl EventDispatcher for InMemoryEventDispatcher {
    fn publish_chart_event(&self, event: ChartEvent) {
        for handler in &self.chart_handlers {
            handler(&event);
        }
    }
}
