//! Canonicalization of raw bar records.
//!
//! Data files disagree on field names (`open`, `Open`, `o`, `10sma`, `SMA10`,
//! `ema10`...) and sometimes carry the real payload as a JSON string under
//! `json`. Everything funnels through one ordered alias table.

use super::entities::{NormalizedBar, RawBar};
use super::value_objects::{CanonicalField, PriceField, SmaSlot};
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::LogComponent;
use crate::{log_debug, log_warn};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};

/// Key holding an embedded JSON document
pub const EMBEDDED_JSON_KEY: &str = "json";

/// Ordered alias table: earlier names win. EMA names come last in each SMA
/// slot so a real SMA always beats the fallback.
pub static FIELD_ALIASES: Lazy<Vec<(CanonicalField, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        (CanonicalField::Price(PriceField::Open), &["open", "Open", "OPEN", "o", "O"][..]),
        (CanonicalField::Price(PriceField::High), &["high", "High", "HIGH", "h", "H"][..]),
        (CanonicalField::Price(PriceField::Low), &["low", "Low", "LOW", "l", "L"][..]),
        (
            CanonicalField::Price(PriceField::Close),
            &["close", "Close", "CLOSE", "c", "C", "adjClose", "Adj Close"][..],
        ),
        (CanonicalField::Volume, &["volume", "Volume", "VOLUME", "v", "V", "vol", "Vol"][..]),
        (
            CanonicalField::Sma(SmaSlot::Sma10),
            &[
                "sma10", "SMA10", "Sma10", "ma10", "MA10", "10sma", "10SMA", "sma_10", "SMA_10",
                "ema10", "EMA10", "10ema", "10EMA", "ema_10",
            ][..],
        ),
        (
            CanonicalField::Sma(SmaSlot::Sma20),
            &[
                "sma20", "SMA20", "Sma20", "ma20", "MA20", "20sma", "20SMA", "sma_20", "SMA_20",
                "ema20", "EMA20", "20ema", "20EMA", "ema_20",
            ][..],
        ),
        (
            CanonicalField::Sma(SmaSlot::Sma50),
            &[
                "sma50", "SMA50", "Sma50", "ma50", "MA50", "50sma", "50SMA", "sma_50", "SMA_50",
                "ema50", "EMA50", "50ema", "50EMA", "ema_50",
            ][..],
        ),
    ]
});

fn aliases_for(field: CanonicalField) -> &'static [&'static str] {
    FIELD_ALIASES
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

/// Finite number from a JSON number or numeric string
fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// First alias of `field` present in `record` with a usable numeric value
pub fn resolve_field(record: &Map<String, Value>, field: CanonicalField) -> Option<f64> {
    aliases_for(field).iter().find_map(|name| record.get(*name).and_then(numeric))
}

/// Merge an embedded `json` string over the record. Fields from the string
/// win. A malformed string leaves the record as it was.
pub fn merge_embedded_json(record: &Map<String, Value>, index: usize) -> (Map<String, Value>, Option<ChartError>) {
    let Some(Value::String(embedded)) = record.get(EMBEDDED_JSON_KEY) else {
        return (record.clone(), None);
    };

    match serde_json::from_str::<Value>(embedded) {
        Ok(Value::Object(inner)) => {
            let mut merged = record.clone();
            merged.remove(EMBEDDED_JSON_KEY);
            merged.extend(inner);
            (merged, None)
        }
        Ok(other) => {
            let reason = format!("expected object, found {}", json_kind(&other));
            (record.clone(), Some(ChartError::InvalidJsonEmbedding { index, reason }))
        }
        Err(e) => (record.clone(), Some(ChartError::InvalidJsonEmbedding { index, reason: e.to_string() })),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Canonicalize one record at series position `index`
pub fn normalize_bar(raw: &RawBar, index: usize) -> NormalizedBar {
    let (record, embed_error) = merge_embedded_json(raw.fields(), index);
    if let Some(err) = embed_error {
        log_warn!(LogComponent::Domain("Normalizer"), "{}; keeping record as-is", err);
    }

    let price = |f: PriceField| resolve_field(&record, CanonicalField::Price(f));
    let sma = |s: SmaSlot| resolve_field(&record, CanonicalField::Sma(s));

    let mut bar = NormalizedBar {
        index,
        open: price(PriceField::Open),
        high: price(PriceField::High),
        low: price(PriceField::Low),
        close: price(PriceField::Close),
        volume: resolve_field(&record, CanonicalField::Volume).unwrap_or(0.0),
        sma10: sma(SmaSlot::Sma10),
        sma20: sma(SmaSlot::Sma20),
        sma50: sma(SmaSlot::Sma50),
    };

    // Widen the range so the body always sits inside the wick
    if let Some((o, h, l, c)) = bar.ohlc() {
        let body_top = o.max(c);
        let body_bottom = o.min(c);
        if h < body_top || l > body_bottom {
            log_debug!(
                LogComponent::Domain("Normalizer"),
                "bar #{} has body outside wick (o={} h={} l={} c={}), widening",
                index, o, h, l, c
            );
            bar.high = Some(h.max(body_top));
            bar.low = Some(l.min(body_bottom));
        }
    } else {
        let err = ChartError::MalformedBar { index, reason: "unresolved OHLC field".to_string() };
        log_debug!(LogComponent::Domain("Normalizer"), "{}", err);
    }

    bar
}

/// Canonicalize a series. Indices start at `start_index` and stay contiguous
/// even for records that cannot be drawn.
pub fn normalize(raw_series: &[RawBar], start_index: usize) -> Vec<NormalizedBar> {
    raw_series
        .iter()
        .enumerate()
        .map(|(i, raw)| normalize_bar(raw, start_index + i))
        .collect()
}

/// Parse a JSON array payload into raw bars. Non-object entries become empty
/// records so positions are preserved.
pub fn parse_series_payload(json: &str) -> ChartResult<Vec<RawBar>> {
    let value: Value = serde_json::from_str(json)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ChartError::InvalidSeriesPayload(format!(
                "expected array, found {}",
                json_kind(&other)
            )));
        }
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => RawBar(map),
            _ => RawBar::default(),
        })
        .collect())
}
