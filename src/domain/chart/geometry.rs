//! Drawable primitives in chart-local pixels (origin at the inner top-left).

use super::scales::ChartScales;
use super::value_objects::ChartKind;
use crate::domain::market_data::{NormalizedBar, SmaSlot};
use bytemuck::{Pod, Zeroable};
use serde::Serialize;
use std::fmt::Write as _;

/// Bodies thinner than this are drawn at this height
const MIN_BODY_HEIGHT: f32 = 1.0;

/// One candle, laid out for instanced drawing
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandlePrimitive {
    /// Center of the candle
    pub x: f32,
    pub width: f32,
    /// Top of the body, `y(max(open, close))`
    pub body_top: f32,
    /// Bottom of the body, `y(min(open, close))`
    pub body_bottom: f32,
    /// `y(high)`
    pub wick_top: f32,
    /// `y(low)`
    pub wick_bottom: f32,
    /// 1.0 when close >= open
    pub bullish: f32,
    /// 1.0 for bars after the divider
    pub future: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePrimitive {
    /// Left edge
    pub x: f32,
    pub width: f32,
    pub top: f32,
    pub bottom: f32,
    pub bullish: f32,
    pub future: f32,
}

/// Moving-average polyline, split wherever a value is missing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmaPath {
    pub slot: SmaSlot,
    pub runs: Vec<Vec<[f64; 2]>>,
}

impl SmaPath {
    /// SVG path data, one `M ... L ...` subpath per run
    pub fn to_svg_path(&self) -> String {
        let mut d = String::new();
        for run in self.runs.iter().filter(|r| !r.is_empty()) {
            for (i, [x, y]) in run.iter().enumerate() {
                let cmd = if i == 0 { 'M' } else { 'L' };
                if !d.is_empty() {
                    d.push(' ');
                }
                let _ = write!(d, "{} {:.2} {:.2}", cmd, x, y);
            }
        }
        d
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.is_empty())
    }
}

/// Divider line, future panel and the mask that uncovers it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealOverlay {
    pub divider_x: f64,
    pub panel_x: f64,
    pub panel_width: f64,
    /// Left edge of the still-hidden area
    pub mask_x: f64,
    pub mask_width: f64,
}

impl RevealOverlay {
    pub fn new(divider_x: f64, inner_width: f64, reveal_progress: f64) -> Self {
        let p = (reveal_progress / 100.0).clamp(0.0, 1.0);
        let panel_width = (inner_width - divider_x).max(0.0);
        let mask_x = divider_x + panel_width * p;
        Self {
            divider_x,
            panel_x: divider_x,
            panel_width,
            mask_x,
            mask_width: (inner_width - mask_x).max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartGeometry {
    pub candles: Vec<CandlePrimitive>,
    pub volume_bars: Vec<VolumePrimitive>,
    pub sma_paths: Vec<SmaPath>,
    pub overlay: Option<RevealOverlay>,
    pub revealed_count: usize,
}

impl ChartGeometry {
    pub fn future_candles(&self) -> impl Iterator<Item = &CandlePrimitive> {
        self.candles.iter().filter(|c| c.future > 0.5)
    }
}

/// Future bars visible at `reveal_progress` percent
pub fn revealed_count(future_len: usize, reveal_progress: f64) -> usize {
    let p = reveal_progress.clamp(0.0, 100.0);
    ((future_len as f64 * p / 100.0).ceil() as usize).min(future_len)
}

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

fn candle(bar: &NormalizedBar, scales: &ChartScales, future: bool) -> Option<CandlePrimitive> {
    if !bar.is_renderable() {
        return None;
    }
    let (o, h, l, c) = bar.ohlc()?;
    let y = |v: f64| scales.price.scale(v) as f32;
    let mut body_top = y(o.max(c));
    let mut body_bottom = y(o.min(c));
    if body_bottom - body_top < MIN_BODY_HEIGHT {
        let mid = (body_top + body_bottom) / 2.0;
        body_top = mid - MIN_BODY_HEIGHT / 2.0;
        body_bottom = mid + MIN_BODY_HEIGHT / 2.0;
    }
    Some(CandlePrimitive {
        x: scales.bar_center(bar.index) as f32,
        width: scales.bar_width as f32,
        body_top,
        body_bottom,
        wick_top: y(h),
        wick_bottom: y(l),
        bullish: flag(bar.is_bullish()),
        future: flag(future),
    })
}

fn volume_bar(bar: &NormalizedBar, scales: &ChartScales, kind: ChartKind, future: bool) -> Option<VolumePrimitive> {
    if !bar.is_renderable() || !bar.volume.is_finite() || bar.volume <= 0.0 {
        return None;
    }
    let bottom = if kind.fills_container() {
        scales.inner_height + scales.margins.bottom
    } else {
        scales.volume.scale(0.0)
    };
    Some(VolumePrimitive {
        x: scales.bar_left(bar.index) as f32,
        width: scales.bar_width as f32,
        top: scales.volume.scale(bar.volume) as f32,
        bottom: bottom as f32,
        bullish: flag(bar.is_bullish()),
        future: flag(future),
    })
}

fn sma_path(bars: &[&NormalizedBar], slot: SmaSlot, scales: &ChartScales) -> SmaPath {
    let (lo, hi) = scales.price.domain;
    let mut runs = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();
    for bar in bars {
        match bar.sma(slot).filter(|v| v.is_finite() && *v >= lo && *v <= hi) {
            Some(v) => current.push([scales.bar_center(bar.index), scales.price.scale(v)]),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    SmaPath { slot, runs }
}

/// Candles, volume columns, averages and overlay for the historical bars and
/// the first `revealed_count` future bars.
pub fn build_geometry(
    historical: &[NormalizedBar],
    future: &[NormalizedBar],
    revealed_count: usize,
    reveal_progress: f64,
    scales: &ChartScales,
    kind: ChartKind,
) -> ChartGeometry {
    let revealed = &future[..revealed_count.min(future.len())];
    let segments = [(historical, false), (revealed, true)];

    let candles = segments
        .iter()
        .flat_map(|(bars, fut)| bars.iter().filter_map(move |b| candle(b, scales, *fut)))
        .collect();

    let volume_bars = if kind.shows_volume() {
        segments
            .iter()
            .flat_map(|(bars, fut)| bars.iter().filter_map(move |b| volume_bar(b, scales, kind, *fut)))
            .collect()
    } else {
        Vec::new()
    };

    let visible: Vec<&NormalizedBar> = historical.iter().chain(revealed).collect();
    let sma_paths = [SmaSlot::Sma10, SmaSlot::Sma20, SmaSlot::Sma50]
        .into_iter()
        .filter(|slot| *slot != SmaSlot::Sma50 || kind.shows_sma50())
        .map(|slot| sma_path(&visible, slot, scales))
        .filter(|p| !p.is_empty())
        .collect();

    let overlay = (!future.is_empty() && !historical.is_empty())
        .then(|| RevealOverlay::new(scales.divider_x, scales.inner_width, reveal_progress));

    ChartGeometry { candles, volume_bars, sma_paths, overlay, revealed_count: revealed.len() }
}
