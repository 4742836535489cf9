use super::value_objects::{PriceField, SmaSlot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prices closer than this are treated as equal
pub const PRICE_EPSILON: f64 = 1e-9;

/// Raw bar record as delivered by the data files: field names vary and the
/// payload may be nested as a JSON string under `json`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBar(pub Map<String, Value>);

impl RawBar {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawBar {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Domain entity - bar in the canonical schema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedBar {
    pub index: usize,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: f64,
    pub sma10: Option<f64>,
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
}

impl NormalizedBar {
    pub fn price(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    pub fn sma(&self, slot: SmaSlot) -> Option<f64> {
        match slot {
            SmaSlot::Sma10 => self.sma10,
            SmaSlot::Sma20 => self.sma20,
            SmaSlot::Sma50 => self.sma50,
        }
    }

    pub fn set_sma(&mut self, slot: SmaSlot, value: Option<f64>) {
        match slot {
            SmaSlot::Sma10 => self.sma10 = value,
            SmaSlot::Sma20 => self.sma20 = value,
            SmaSlot::Sma50 => self.sma50 = value,
        }
    }

    /// All four prices, when every one resolved
    pub fn ohlc(&self) -> Option<(f64, f64, f64, f64)> {
        Some((self.open?, self.high?, self.low?, self.close?))
    }

    /// Whether the bar can be drawn as a candle: full finite OHLC, a
    /// non-degenerate range and not an all-zero record.
    pub fn is_renderable(&self) -> bool {
        let Some((o, h, l, c)) = self.ohlc() else {
            return false;
        };
        if ![o, h, l, c].iter().all(|v| v.is_finite()) {
            return false;
        }
        if (h - l).abs() <= PRICE_EPSILON * h.abs().max(1.0) {
            return false;
        }
        [o, h, l, c].iter().any(|v| v.abs() > PRICE_EPSILON)
    }

    pub fn is_bullish(&self) -> bool {
        match (self.open, self.close) {
            (Some(o), Some(c)) => c >= o,
            _ => false,
        }
    }
}

/// Aggregate facts about a historical/future pair
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub valid_bars: usize,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub last_close: Option<f64>,
    /// Highest future high, i.e. the outcome a selection is judged against
    pub peak_after: Option<f64>,
    pub peak_after_index: Option<usize>,
}

impl SeriesSummary {
    pub fn from_series(historical: &[NormalizedBar], future: &[NormalizedBar]) -> Self {
        let valid: Vec<&NormalizedBar> = historical.iter().filter(|b| b.is_renderable()).collect();
        let price_min = valid.iter().filter_map(|b| b.low).reduce(f64::min);
        let price_max = valid.iter().filter_map(|b| b.high).reduce(f64::max);
        let last_close = historical.iter().rev().find_map(|b| b.close);

        let peak = future
            .iter()
            .filter(|b| b.is_renderable())
            .filter_map(|b| b.high.map(|h| (b.index, h)))
            .fold(None, |best: Option<(usize, f64)>, (i, h)| match best {
                Some((_, bh)) if bh >= h => best,
                _ => Some((i, h)),
            });

        Self {
            valid_bars: valid.len(),
            price_min,
            price_max,
            last_close,
            peak_after: peak.map(|(_, h)| h),
            peak_after_index: peak.map(|(i, _)| i),
        }
    }
}
