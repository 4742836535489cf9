use breakout_reveal_wasm::domain::chart::ChartKind;
use breakout_reveal_wasm::domain::market_data::{
    NormalizedBar, PriceField, RawBar, compute_sma, prepare_series, with_moving_averages,
};
use quickcheck_macros::quickcheck;
use serde_json::json;

fn bars_from(closes: &[f64]) -> Vec<NormalizedBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| NormalizedBar { index: i, close: Some(*c), ..Default::default() })
        .collect()
}

fn finite(values: Vec<f64>) -> Vec<f64> {
    values.into_iter().filter(|v| v.is_finite()).map(|v| v % 1.0e3).collect()
}

#[quickcheck]
fn leading_entries_are_empty(values: Vec<f64>, period: u8) -> bool {
    let period = (period % 30) as usize + 1;
    let bars = bars_from(&finite(values));
    let sma = compute_sma(&bars, period, PriceField::Close);
    sma.len() == bars.len() && sma.iter().take(period - 1).all(|v| v.is_none())
}

#[quickcheck]
fn full_window_is_arithmetic_mean(values: Vec<f64>, period: u8) -> bool {
    let period = (period % 20) as usize + 1;
    let closes = finite(values);
    let sma = compute_sma(&bars_from(&closes), period, PriceField::Close);
    (period - 1..closes.len()).all(|i| {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        sma[i].is_some_and(|v| (v - mean).abs() <= 1e-6 * mean.abs().max(1.0))
    })
}

#[quickcheck]
fn input_is_left_untouched(values: Vec<f64>) -> bool {
    let bars = bars_from(&finite(values));
    let before = bars.clone();
    let _ = compute_sma(&bars, 10, PriceField::Close);
    let _ = with_moving_averages(&bars, ChartKind::Daily);
    bars == before
}

#[test]
fn future_averages_see_the_historical_window() {
    let bar = |c: f64| {
        let serde_json::Value::Object(map) = json!({"Open": c, "High": c + 1.0, "Low": c - 1.0, "Close": c}) else {
            unreachable!()
        };
        RawBar(map)
    };
    let hist: Vec<RawBar> = (0..9).map(|i| bar(i as f64 + 10.0)).collect();
    let fut: Vec<RawBar> = (0..3).map(|i| bar(i as f64 + 19.0)).collect();

    let (hist, fut) = prepare_series(&hist, &fut, ChartKind::Daily);

    assert_eq!(hist.len(), 9);
    assert!(hist.iter().all(|b| b.sma10.is_none()));
    assert_eq!(fut[0].index, 9);
    // closes 10..=19
    assert_eq!(fut[0].sma10, Some(14.5));
}

#[test]
fn hourly_chart_never_shows_sma50() {
    let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
    let out = with_moving_averages(&bars_from(&closes), ChartKind::Hourly);
    assert!(out.iter().all(|b| b.sma50.is_none()));
    assert!(out[79].sma10.is_some());
}
