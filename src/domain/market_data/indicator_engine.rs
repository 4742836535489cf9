use super::entities::{NormalizedBar, RawBar};
use super::normalizer::normalize;
use super::value_objects::{PriceField, SmaSlot};
use crate::domain::chart::value_objects::ChartKind;
use crate::domain::logging::LogComponent;
use crate::log_debug;
use std::collections::VecDeque;

/// Share of a window that must hold valid prices for an SMA to be emitted
pub const SMA_VALID_RATIO: f64 = 0.8;

/// Default ceiling on green candles before a series looks suspicious
pub const MAX_GREEN_RATIO: f64 = 0.75;

/// Minimum valid prices a window of `period` needs: `ceil(period * 0.8)`
pub fn min_valid_for(period: usize) -> usize {
    (period as f64 * SMA_VALID_RATIO).ceil() as usize
}

/// Trailing window that tolerates gaps: keeps the raw slots so it knows how
/// many of the last `period` prices were actually present.
#[derive(Debug, Clone)]
struct GapTolerantWindow {
    period: usize,
    min_valid: usize,
    slots: VecDeque<Option<f64>>,
    sum: f64,
    valid: usize,
}

impl GapTolerantWindow {
    fn new(period: usize) -> Self {
        Self {
            period,
            min_valid: min_valid_for(period),
            slots: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            valid: 0,
        }
    }

    fn push(&mut self, price: Option<f64>) -> Option<f64> {
        let price = price.filter(|p| p.is_finite());
        self.slots.push_back(price);
        if let Some(p) = price {
            self.sum += p;
            self.valid += 1;
        }
        if self.slots.len() > self.period
            && let Some(Some(old)) = self.slots.pop_front()
        {
            self.sum -= old;
            self.valid -= 1;
        }

        if self.slots.len() < self.period || self.valid < self.min_valid || self.valid == 0 {
            None
        } else {
            Some(self.sum / self.valid as f64)
        }
    }
}

/// Simple moving average of `field` over `period` bars.
///
/// The first `period - 1` entries are `None`. After that, each entry is the
/// mean of the valid prices in the trailing window, provided at least
/// `ceil(period * 0.8)` of them are valid. Pure: `bars` is not touched.
pub fn compute_sma(bars: &[NormalizedBar], period: usize, field: PriceField) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }
    let mut window = GapTolerantWindow::new(period);
    bars.iter().map(|bar| window.push(bar.price(field))).collect()
}

/// Copy of `bars` with missing SMA slots filled in.
///
/// SMA10/SMA20 are computed wherever the input lacks them. SMA50 likewise,
/// except for kinds whose display policy hides it, where it is cleared.
pub fn with_moving_averages(bars: &[NormalizedBar], kind: ChartKind) -> Vec<NormalizedBar> {
    let mut out = bars.to_vec();
    for slot in [SmaSlot::Sma10, SmaSlot::Sma20, SmaSlot::Sma50] {
        if slot == SmaSlot::Sma50 && !kind.shows_sma50() {
            out.iter_mut().for_each(|b| b.set_sma(slot, None));
            continue;
        }
        if out.iter().all(|b| b.sma(slot).is_some()) {
            continue;
        }
        let computed = compute_sma(bars, slot.period(), PriceField::Close);
        let mut filled = 0usize;
        for (bar, value) in out.iter_mut().zip(computed) {
            if bar.sma(slot).is_none() && value.is_some() {
                bar.set_sma(slot, value);
                filled += 1;
            }
        }
        log_debug!(LogComponent::Domain("IndicatorEngine"), "filled {} {} values", filled, slot);
    }
    out
}

/// Normalize both series of a card and derive their averages together, so
/// the first future bars see the historical window behind them.
pub fn prepare_series(
    historical_raw: &[RawBar],
    future_raw: &[RawBar],
    kind: ChartKind,
) -> (Vec<NormalizedBar>, Vec<NormalizedBar>) {
    let historical = normalize(historical_raw, 0);
    let future = normalize(future_raw, historical.len());

    let mut combined = historical;
    combined.extend(future);
    let mut combined = with_moving_averages(&combined, kind);

    let future = combined.split_off(historical_raw.len());
    (combined, future)
}

/// False when more than `max_green` of the renderable bars closed above their
/// open, which usually means a broken data file.
pub fn candle_distribution_ok(bars: &[NormalizedBar], max_green: f64) -> bool {
    let valid: Vec<&NormalizedBar> = bars.iter().filter(|b| b.is_renderable()).collect();
    if valid.is_empty() {
        return true;
    }
    let green = valid
        .iter()
        .filter(|b| matches!((b.open, b.close), (Some(o), Some(c)) if c > o))
        .count();
    green as f64 / valid.len() as f64 <= max_green
}
