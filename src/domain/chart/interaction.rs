//! Pointer input mapped back into data space.
//!
//! Only positions strictly right of the last historical candle can be
//! selected; they resolve to extrapolated future time indices.

use super::scales::ChartScales;
use super::value_objects::ChartMargins;
use crate::domain::errors::{ChartError, RejectReason};
use crate::domain::logging::LogComponent;
use crate::log_debug;
use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// Movement beyond which a press becomes a pan
pub const PAN_THRESHOLD_PX: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerPosition {
    pub client_x: f64,
    pub client_y: f64,
}

/// Bounding box of the chart element in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBounds {
    pub left: f64,
    pub top: f64,
}

/// A predicted peak. Pixel fields are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub time_index: usize,
    pub price: f64,
    pub chart_x: f64,
    pub chart_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ClickOutcome {
    Selected { selection: Selection },
    Rejected { reason: RejectReason },
}

impl ClickOutcome {
    pub fn selection(&self) -> Option<Selection> {
        match self {
            ClickOutcome::Selected { selection } => Some(*selection),
            ClickOutcome::Rejected { .. } => None,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        log_debug!(LogComponent::Domain("Interaction"), "{}", ChartError::RejectedSelection(reason));
        ClickOutcome::Rejected { reason }
    }
}

/// Client pixels to chart-local pixels
pub fn to_chart_local(pointer: PointerPosition, bounds: ElementBounds, margins: &ChartMargins) -> (f64, f64) {
    (pointer.client_x - bounds.left - margins.left, pointer.client_y - bounds.top - margins.top)
}

pub fn map_click(
    pointer: PointerPosition,
    bounds: ElementBounds,
    scales: &ChartScales,
    historical_len: usize,
    selection_enabled: bool,
) -> ClickOutcome {
    if !selection_enabled {
        return ClickOutcome::rejected(RejectReason::SelectionDisabled);
    }
    if historical_len == 0 {
        return ClickOutcome::rejected(RejectReason::EmptySeries);
    }
    let (chart_x, chart_y) = to_chart_local(pointer, bounds, &scales.margins);
    map_chart_point(chart_x, chart_y, scales, historical_len)
}

/// Same as [`map_click`] for coordinates already in chart-local space
pub fn map_chart_point(chart_x: f64, chart_y: f64, scales: &ChartScales, historical_len: usize) -> ClickOutcome {
    let Some(last) = historical_len.checked_sub(1) else {
        return ClickOutcome::rejected(RejectReason::EmptySeries);
    };
    if !chart_x.is_finite() || !chart_y.is_finite() || chart_y < 0.0 || chart_y > scales.inner_height {
        return ClickOutcome::rejected(RejectReason::OutsidePlot);
    }
    let edge = scales.bar_right(last);
    if chart_x <= edge {
        return ClickOutcome::rejected(RejectReason::BeforeBoundary);
    }

    let step = scales.step();
    let steps_beyond = if step > 0.0 { ((chart_x - edge) / step).round() as usize } else { 0 };
    let selection = Selection {
        time_index: last + steps_beyond + 1,
        price: scales.price.invert(chart_y).max(0.0),
        chart_x,
        chart_y,
    };
    ClickOutcome::Selected { selection }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Serialize)]
pub enum CursorStyle {
    #[strum(serialize = "not-allowed")]
    #[serde(rename = "not-allowed")]
    NotAllowed,
    #[strum(serialize = "crosshair")]
    #[serde(rename = "crosshair")]
    Crosshair,
}

/// How a press-move-release sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// Short press in the selectable region
    Tap,
    Pan,
    /// Release without a press, or a press outside the selectable region
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    x: f64,
    y: f64,
    selectable: bool,
}

/// Distinguishes taps from pans and picks the cursor, in chart-local pixels
#[derive(Debug, Clone)]
pub struct PointerTracker {
    selection_enabled: bool,
    threshold_px: f64,
    press: Option<Press>,
    panning: bool,
}

impl PointerTracker {
    pub fn new(selection_enabled: bool) -> Self {
        Self { selection_enabled, threshold_px: PAN_THRESHOLD_PX, press: None, panning: false }
    }

    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    fn selectable(&self, chart_x: f64, scales: &ChartScales) -> bool {
        self.selection_enabled && scales.last_historical_edge().is_some_and(|edge| chart_x > edge)
    }

    pub fn cursor_at(&self, chart_x: f64, scales: &ChartScales) -> CursorStyle {
        if self.selectable(chart_x, scales) { CursorStyle::Crosshair } else { CursorStyle::NotAllowed }
    }

    pub fn pointer_down(&mut self, chart_x: f64, chart_y: f64, scales: &ChartScales) {
        self.panning = false;
        self.press = Some(Press { x: chart_x, y: chart_y, selectable: self.selectable(chart_x, scales) });
    }

    pub fn pointer_move(&mut self, chart_x: f64, chart_y: f64, scales: &ChartScales) -> CursorStyle {
        if let Some(press) = self.press
            && (chart_x - press.x).hypot(chart_y - press.y) > self.threshold_px
        {
            self.panning = true;
        }
        self.cursor_at(chart_x, scales)
    }

    pub fn pointer_up(&mut self, chart_x: f64, chart_y: f64) -> Gesture {
        let Some(press) = self.press.take() else {
            return Gesture::Ignored;
        };
        let moved = (chart_x - press.x).hypot(chart_y - press.y) > self.threshold_px;
        let panned = std::mem::take(&mut self.panning) || moved;
        match (panned, press.selectable) {
            (true, _) => Gesture::Pan,
            (false, true) => Gesture::Tap,
            (false, false) => Gesture::Ignored,
        }
    }

    pub fn cancel(&mut self) {
        self.press = None;
        self.panning = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayoutConfig, SolverConfig};
    use crate::domain::chart::scales::{ScaleRequest, compute_scales};
    use crate::domain::chart::value_objects::{ChartKind, ChartViewport, DeviceClass};
    use crate::domain::market_data::NormalizedBar;

    fn scales(n: usize) -> ChartScales {
        let hist: Vec<_> = (0..n)
            .map(|i| NormalizedBar {
                index: i,
                open: Some(10.0),
                high: Some(12.0),
                low: Some(9.0),
                close: Some(11.0),
                volume: 1.0,
                ..Default::default()
            })
            .collect();
        let request = ScaleRequest {
            revealed_count: 0,
            zoom_progress: 0.0,
            viewport: ChartViewport::new(800.0, 400.0, DeviceClass::Wide),
            kind: ChartKind::Daily,
            allow_extension: true,
        };
        compute_scales(&hist, &[], &request, &LayoutConfig::default(), &SolverConfig::default())
    }

    #[test]
    fn click_left_of_edge_is_rejected() {
        let s = scales(20);
        let edge = s.bar_right(19);
        let outcome = map_chart_point(edge, 100.0, &s, 20);
        assert_eq!(outcome, ClickOutcome::Rejected { reason: RejectReason::BeforeBoundary });
    }

    #[test]
    fn click_right_of_edge_selects_next_index() {
        let s = scales(20);
        let outcome = map_chart_point(s.bar_right(19) + 0.1, 100.0, &s, 20);
        let selection = outcome.selection().unwrap();
        assert_eq!(selection.time_index, 20);
        assert!((selection.price - s.price.invert(100.0)).abs() < 1e-9);
    }

    #[test]
    fn client_coordinates_account_for_bounds_and_margins() {
        let s = scales(20);
        let bounds = ElementBounds { left: 100.0, top: 50.0 };
        let x = s.bar_right(19) + s.step() * 2.0 + bounds.left + s.margins.left;
        let y = 80.0 + bounds.top + s.margins.top;
        let outcome = map_click(PointerPosition { client_x: x, client_y: y }, bounds, &s, 20, true);
        assert_eq!(outcome.selection().unwrap().time_index, 22);
        assert!((outcome.selection().unwrap().chart_y - 80.0).abs() < 1e-9);
    }

    #[test]
    fn disabled_and_outside_are_rejected() {
        let s = scales(20);
        let p = PointerPosition { client_x: 700.0, client_y: 100.0 };
        assert_eq!(
            map_click(p, ElementBounds::default(), &s, 20, false),
            ClickOutcome::Rejected { reason: RejectReason::SelectionDisabled }
        );
        assert_eq!(
            map_chart_point(700.0, -5.0, &s, 20),
            ClickOutcome::Rejected { reason: RejectReason::OutsidePlot }
        );
    }

    #[test]
    fn small_jitter_is_a_tap_large_move_is_a_pan() {
        let s = scales(20);
        let x = s.bar_right(19) + 20.0;
        let mut tracker = PointerTracker::new(true);

        tracker.pointer_down(x, 100.0, &s);
        assert_eq!(tracker.pointer_move(x + 3.0, 102.0, &s), CursorStyle::Crosshair);
        assert_eq!(tracker.pointer_up(x + 3.0, 102.0), Gesture::Tap);

        tracker.pointer_down(x, 100.0, &s);
        tracker.pointer_move(x + 10.0, 100.0, &s);
        assert!(tracker.is_panning());
        assert_eq!(tracker.pointer_up(x, 100.0), Gesture::Pan);
    }

    #[test]
    fn press_over_history_never_selects() {
        let s = scales(20);
        let mut tracker = PointerTracker::new(true);
        tracker.pointer_down(10.0, 100.0, &s);
        assert_eq!(tracker.cursor_at(10.0, &s), CursorStyle::NotAllowed);
        assert_eq!(tracker.pointer_up(10.0, 100.0), Gesture::Ignored);
    }
}
