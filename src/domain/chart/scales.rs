//! Pixel scales for one chart frame.
//!
//! The time axis is a point scale whose range is solved so that the right
//! edge of the last historical candle lands on the divider, whatever else
//! (future bars, click-target extension) shares the axis.

use super::value_objects::{ChartKind, ChartMargins, ChartViewport, LinearScale, PointScale};
use crate::config::{LayoutConfig, SolverConfig};
use crate::domain::errors::ChartError;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::NormalizedBar;
use crate::{log_trace, log_warn};
use serde::Serialize;

/// Ranges wider than this multiple of the inner width are treated as diverged
const MAX_RANGE_FACTOR: f64 = 1000.0;

/// Outcome of the divider-alignment search
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveReport {
    pub iterations: usize,
    pub converged: bool,
    /// Larger of the two edge errors of the returned range
    pub error_px: f64,
}

/// Everything needed to place a bar, a volume column or a click
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartScales {
    pub price: LinearScale,
    pub volume: LinearScale,
    pub time: PointScale,
    pub margins: ChartMargins,
    pub inner_width: f64,
    pub inner_height: f64,
    pub price_height: f64,
    pub volume_height: f64,
    pub divider_x: f64,
    pub bar_width: f64,
    pub is_zoomed: bool,
    pub historical_len: usize,
    /// Indices backed by data (historical plus future once zoomed)
    pub data_len: usize,
    /// Synthetic indices appended after the data as click targets
    pub extension_len: usize,
    pub solve: SolveReport,
}

impl ChartScales {
    pub fn bar_center(&self, index: usize) -> f64 {
        self.time.position(index)
    }

    pub fn bar_left(&self, index: usize) -> f64 {
        self.bar_center(index) - self.bar_width / 2.0
    }

    pub fn bar_right(&self, index: usize) -> f64 {
        self.bar_center(index) + self.bar_width / 2.0
    }

    pub fn step(&self) -> f64 {
        self.time.step()
    }

    /// Right edge of the last historical candle, i.e. the selection boundary
    pub fn last_historical_edge(&self) -> Option<f64> {
        self.historical_len.checked_sub(1).map(|i| self.bar_right(i))
    }
}

/// Inputs of [`compute_scales`] besides the series themselves
#[derive(Debug, Clone, Copy)]
pub struct ScaleRequest {
    pub revealed_count: usize,
    /// Eased zoom progress in `[0, 100]`
    pub zoom_progress: f64,
    pub viewport: ChartViewport,
    pub kind: ChartKind,
    pub allow_extension: bool,
}

pub fn compute_scales(
    historical: &[NormalizedBar],
    future: &[NormalizedBar],
    request: &ScaleRequest,
    layout: &LayoutConfig,
    solver: &SolverConfig,
) -> ChartScales {
    let viewport = &request.viewport;
    let kind = request.kind;
    let margins = layout.margins(viewport.device);
    let inner_width = viewport.inner_width(&margins);
    let inner_height = viewport.inner_height(&margins);

    let zoom = (request.zoom_progress / 100.0).clamp(0.0, 1.0);
    let is_zoomed = request.zoom_progress > 0.0;

    // Price
    let price_domain = price_domain(historical, future, zoom, kind);
    let price_height = inner_height;
    let price = LinearScale::new(price_domain, (price_height, 0.0));

    // Volume
    let volume_height = if kind.shows_volume() {
        inner_height * layout.volume_fraction(viewport.device)
    } else {
        0.0
    };
    let revealed = request.revealed_count.min(future.len());
    let future_volume =
        if kind.uses_historical_price_domain() || !is_zoomed { &future[..0] } else { &future[..revealed] };
    let max_volume = historical
        .iter()
        .chain(future_volume)
        .map(|b| b.volume)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let volume_top = if max_volume > 0.0 { max_volume * kind.volume_headroom() } else { 1.0 };
    let volume = LinearScale::new((0.0, volume_top), (inner_height, inner_height - volume_height));

    // Time
    let historical_len = historical.len();
    let data_len = historical_len + if is_zoomed { future.len() } else { 0 };
    let extension_len =
        if request.allow_extension { layout.extension_count(viewport.device, data_len) } else { 0 };
    let divider_x = inner_width * layout.divider_fraction(viewport.device);

    let (time, solve) = if historical_len == 0 || inner_width <= 0.0 {
        let len = (data_len + extension_len).max(1);
        let report = SolveReport { iterations: 0, converged: true, error_px: 0.0 };
        (PointScale::new(len, (0.0, inner_width), layout.time_padding), report)
    } else {
        let target = DividerTarget { last_hist: historical_len - 1, divider_x, inner_width };
        solve_time_scale(target, data_len, extension_len, layout, solver)
    };

    ChartScales {
        price,
        volume,
        time,
        margins,
        inner_width,
        inner_height,
        price_height,
        volume_height,
        divider_x,
        bar_width: time.step() * layout.bar_width_ratio,
        is_zoomed,
        historical_len,
        data_len,
        extension_len,
        solve,
    }
}

/// Price samples a bar contributes: high, low, close and displayed averages
fn price_samples(bar: &NormalizedBar, kind: ChartKind) -> impl Iterator<Item = f64> {
    let sma50 = if kind.shows_sma50() { bar.sma50 } else { None };
    [bar.high, bar.low, bar.close, bar.sma10, bar.sma20, sma50]
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
}

fn extent<'a>(bars: impl Iterator<Item = &'a NormalizedBar>, kind: ChartKind) -> Option<(f64, f64)> {
    bars.filter(|b| b.is_renderable())
        .flat_map(|b| price_samples(b, kind))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn widen_degenerate((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi - lo > 0.0 {
        return (lo, hi);
    }
    let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.01 };
    (lo - pad, hi + pad)
}

/// Price domain for the current zoom factor in `[0, 1]`
pub fn price_domain(historical: &[NormalizedBar], future: &[NormalizedBar], zoom: f64, kind: ChartKind) -> (f64, f64) {
    let Some(hist) = extent(historical.iter(), kind) else {
        return match extent(future.iter(), kind) {
            Some(f) if zoom > 0.0 && !kind.uses_historical_price_domain() => widen_degenerate(f),
            _ => (0.0, 1.0),
        };
    };

    if kind.uses_historical_price_domain() {
        let (lo, hi) = widen_degenerate(hist);
        let range = hi - lo;
        return (lo - range * 0.1, hi + range * 0.5);
    }

    let combined = extent(historical.iter().chain(future), kind).unwrap_or(hist);
    let lo = hist.0 + (combined.0 - hist.0) * zoom;
    let hi = hist.1 + (combined.1 - hist.1) * zoom;
    let (lo, hi) = widen_degenerate((lo, hi));
    let pad = (hi - lo) * kind.price_padding();
    (lo - pad, hi + pad)
}

/// Edge errors of a trial range: first candle's left edge against 0 and the
/// last historical candle's right edge against the divider.
fn edge_errors(scale: &PointScale, last_hist: usize, bar_ratio: f64, divider_x: f64) -> (f64, f64) {
    let half = scale.step() * bar_ratio / 2.0;
    let left = scale.position(0) - half;
    let right = scale.position(last_hist) + half;
    (left, right - divider_x)
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    range: (f64, f64),
    error: f64,
}

fn range_is_sane(range: (f64, f64), inner_width: f64) -> bool {
    let width = range.1 - range.0;
    range.0.is_finite() && range.1.is_finite() && width > 0.0 && width < inner_width.max(1.0) * MAX_RANGE_FACTOR
}

/// Where the last historical bar has to end, and the plot it lives in
#[derive(Debug, Clone, Copy)]
struct DividerTarget {
    last_hist: usize,
    divider_x: f64,
    inner_width: f64,
}

/// Damped fixed-point search over `[r0, r1]` for a scale of `len` points
fn iterate_range(
    start: (f64, f64),
    len: usize,
    target: DividerTarget,
    budget: usize,
    layout: &LayoutConfig,
    solver: &SolverConfig,
) -> (Candidate, usize, bool) {
    let DividerTarget { last_hist, divider_x, inner_width } = target;
    let mut range = start;
    let mut best: Option<Candidate> = None;

    for iteration in 1..=budget {
        let scale = PointScale::new(len, range, layout.time_padding);
        let (left_err, right_err) = edge_errors(&scale, last_hist, layout.bar_width_ratio, divider_x);
        let error = left_err.abs().max(right_err.abs());

        let sane = range_is_sane(range, inner_width) && error.is_finite();
        if sane && best.is_none_or(|b| error < b.error) {
            best = Some(Candidate { range, error });
        }
        if sane && error < solver.epsilon_px {
            return (Candidate { range, error }, iteration, true);
        }

        // Rescale so the measured span matches the target
        let measured = (right_err + divider_x) - left_err;
        let factor = if measured > 0.0 { divider_x / measured } else { 2.0 };
        let width = (range.1 - range.0) * (1.0 + solver.damping * (factor - 1.0));

        // then shift the rescaled range towards a zero left edge
        let rescaled = PointScale::new(len, (range.0, range.0 + width), layout.time_padding);
        let (left_after, _) = edge_errors(&rescaled, last_hist, layout.bar_width_ratio, divider_x);
        let r0 = range.0 - solver.damping * left_after;
        range = (r0, r0 + width);
        log_trace!(
            LogComponent::Domain("ScaleSolver"),
            "iteration {}: left={:.4} right={:.4}",
            iteration,
            left_err,
            right_err
        );
    }

    let fallback = best.unwrap_or(Candidate { range: start, error: f64::INFINITY });
    (fallback, budget, false)
}

fn solve_time_scale(
    target: DividerTarget,
    data_len: usize,
    extension_len: usize,
    layout: &LayoutConfig,
    solver: &SolverConfig,
) -> (PointScale, SolveReport) {
    let DividerTarget { last_hist, divider_x, .. } = target;
    let padding = layout.time_padding;

    // Analytic estimate: one step per historical slot up to the divider
    let step = divider_x / (last_hist as f64 + layout.bar_width_ratio);
    let slots = (data_len as f64 - 1.0 + 2.0 * padding).max(1.0);
    let r0 = -step * (padding - layout.bar_width_ratio / 2.0);
    let estimate = (r0, r0 + step * slots);

    let (mut candidate, mut iterations, mut converged) =
        iterate_range(estimate, data_len, target, solver.max_iterations, layout, solver);

    let len = data_len + extension_len;
    if extension_len > 0 {
        let (refined, extra, ok) =
            iterate_range(candidate.range, len, target, solver.refine_iterations, layout, solver);
        candidate = refined;
        iterations += extra;
        converged = ok;
    }

    if !converged {
        let err = ChartError::NonConvergentScaleSolve { iterations, error_px: candidate.error };
        log_warn!(LogComponent::Domain("ScaleSolver"), "{}; using best candidate", err);
    }

    let report = SolveReport { iterations, converged, error_px: candidate.error };
    (PointScale::new(len, candidate.range, padding), report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::value_objects::DeviceClass;

    fn bars(n: usize, start: usize, base: f64) -> Vec<NormalizedBar> {
        (0..n)
            .map(|i| {
                let c = base + i as f64;
                NormalizedBar {
                    index: start + i,
                    open: Some(c - 0.5),
                    high: Some(c + 1.0),
                    low: Some(c - 1.0),
                    close: Some(c),
                    volume: 100.0 + i as f64,
                    ..Default::default()
                }
            })
            .collect()
    }

    fn request(kind: ChartKind, zoom: f64, device: DeviceClass, allow_extension: bool) -> ScaleRequest {
        let width = if device == DeviceClass::Narrow { 375.0 } else { 1024.0 };
        ScaleRequest {
            revealed_count: 0,
            zoom_progress: zoom,
            viewport: ChartViewport::new(width, 400.0, device),
            kind,
            allow_extension,
        }
    }

    #[test]
    fn historical_edge_sits_on_divider() {
        let hist = bars(50, 0, 100.0);
        let fut = bars(20, 50, 150.0);
        let s = compute_scales(
            &hist,
            &fut,
            &request(ChartKind::Daily, 100.0, DeviceClass::Wide, true),
            &LayoutConfig::default(),
            &SolverConfig::default(),
        );
        assert!(s.solve.converged);
        assert!((s.bar_right(49) - s.divider_x).abs() < 0.1);
        assert!(s.bar_left(0).abs() < 0.1);
        assert_eq!(s.extension_len, 35);
    }

    #[test]
    fn divergence_cap_follows_inner_width() {
        assert!(range_is_sane((0.0, 900.0 * 200.0), 200.0));
        assert!(!range_is_sane((0.0, 1100.0 * 200.0), 200.0));
        assert!(!range_is_sane((f64::NAN, 10.0), 200.0));
    }

    #[test]
    fn very_long_future_still_aligns() {
        // one historical bar against a thousand future bars: the range spans
        // far more than 1000 divider widths but stays under 1000 plot widths
        let hist = bars(1, 0, 100.0);
        let fut = bars(1000, 1, 100.0);
        let s = compute_scales(
            &hist,
            &fut,
            &request(ChartKind::Daily, 100.0, DeviceClass::Wide, false),
            &LayoutConfig::default(),
            &SolverConfig::default(),
        );
        assert!(s.solve.converged);
        assert!(s.solve.error_px.is_finite());
        assert!((s.bar_right(0) - s.divider_x).abs() < 0.1);
    }

    #[test]
    fn historical_kind_pads_asymmetrically() {
        let hist = bars(3, 0, 10.0);
        // lows 9..11, highs 11..13 -> [9, 13]
        let (lo, hi) = price_domain(&hist, &[], 0.0, ChartKind::Historical);
        assert!((lo - 8.6).abs() < 1e-9);
        assert!((hi - 15.0).abs() < 1e-9);
    }

    #[test]
    fn previous_kind_has_no_padding() {
        let hist = bars(3, 0, 10.0);
        assert_eq!(price_domain(&hist, &[], 0.0, ChartKind::Previous), (9.0, 13.0));
    }

    #[test]
    fn empty_series_uses_unit_domain() {
        assert_eq!(price_domain(&[], &[], 0.0, ChartKind::Daily), (0.0, 1.0));
    }

    #[test]
    fn flat_domain_is_widened() {
        assert_eq!(widen_degenerate((0.0, 0.0)), (-1.0, 1.0));
        let (lo, hi) = widen_degenerate((200.0, 200.0));
        assert!((lo - 198.0).abs() < 1e-9 && (hi - 202.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_hides_volume_band() {
        let hist = bars(10, 0, 10.0);
        let s = compute_scales(
            &hist,
            &[],
            &request(ChartKind::Monthly, 0.0, DeviceClass::Narrow, false),
            &LayoutConfig::default(),
            &SolverConfig::default(),
        );
        assert_eq!(s.volume_height, 0.0);
    }

    #[test]
    fn volume_domain_has_headroom() {
        let hist = bars(10, 0, 10.0);
        let s = compute_scales(
            &hist,
            &[],
            &request(ChartKind::Daily, 0.0, DeviceClass::Wide, false),
            &LayoutConfig::default(),
            &SolverConfig::default(),
        );
        assert!((s.volume.domain.1 - 109.0 * 1.1).abs() < 1e-9);
        assert!((s.volume_height - s.inner_height * 0.2).abs() < 1e-9);
    }
}
