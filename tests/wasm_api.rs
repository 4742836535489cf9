#![cfg(feature = "render")]

use breakout_reveal_wasm::presentation::BreakoutChartApi;
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn call(api: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let f: Function = Reflect::get(api, &JsValue::from_str(method))?.into();
    f.apply(api, &args.iter().collect::<Array>())
}

/// Event handler that reads a frame back from inside the callback
fn reentrant_handler(api: &JsValue, seen: &Array) -> Function {
    let factory = Function::new_with_args(
        "api, seen",
        "return function (event) { try { api.frame(); api.generation(); seen.push('ok'); } \
         catch (err) { seen.push('error: ' + err); } };",
    );
    factory.call2(&JsValue::NULL, api, seen).unwrap().into()
}

#[wasm_bindgen_test]
fn event_handlers_can_call_back_into_the_api() {
    let api = BreakoutChartApi::new("chart".to_string(), "daily", None).unwrap();
    api.load_series(
        r#"[{"Open": 10, "High": 11, "Low": 9, "Close": 10.5}, {"Open": 10.5, "High": 12, "Low": 10, "Close": 11}]"#,
        r#"[{"Open": 11, "High": 13, "Low": 10.5, "Close": 12.5}]"#,
    )
    .unwrap();
    let api: JsValue = api.into();
    let seen = Array::new();
    call(&api, "onEvent", &[reentrant_handler(&api, &seen).into()]).unwrap();

    call(&api, "setFeedback", &[JsValue::from_f64(1.0)]).unwrap();
    call(&api, "startReveal", &[JsValue::from_f64(2.0)]).unwrap();
    call(&api, "reset", &[]).unwrap();

    let outcomes: Vec<String> = seen.iter().filter_map(|v| v.as_string()).collect();
    assert!(!outcomes.is_empty());
    assert!(outcomes.iter().all(|o| o == "ok"), "{:?}", outcomes);
}
