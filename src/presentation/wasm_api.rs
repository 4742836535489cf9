//! JavaScript bridge. Minimal logic: forwards to [`ChartSession`] and owns
//! the browser animation driver for the current run.

use crate::application::ChartSession;
use crate::config::EngineConfig;
use crate::domain::animation::{StartOutcome, TickOutcome};
use crate::domain::chart::{ChartKind, ElementBounds, PointerPosition};
use crate::domain::errors::ChartError;
use crate::domain::events::ChartEvent;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{normalize, parse_series_payload};
use crate::infrastructure::scheduler::AnimationDriver;
use crate::infrastructure::services::now_ms;
use crate::{log_debug, log_warn};
use gloo::utils::format::JsValueSerdeExt;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_error(err: ChartError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Callbacks registered from JS, shared with the driver loop
#[derive(Default)]
struct Listeners {
    on_event: Option<js_sys::Function>,
    on_frame: Option<js_sys::Function>,
}

/// Events queued by the session and delivered once no borrow is held. Every
/// entry point takes `&self`, so callbacks may call straight back into the API.
type EventQueue = Rc<RefCell<Vec<ChartEvent>>>;

fn deliver(queue: &EventQueue, listeners: &Rc<RefCell<Listeners>>, container_id: &str) {
    let events = std::mem::take(&mut *queue.borrow_mut());
    if events.is_empty() {
        return;
    }
    let callback = listeners.borrow().on_event.clone();
    for event in events {
        if matches!(event, ChartEvent::ScrollIntoView { .. }) {
            scroll_into_view(container_id);
        }
        if let Some(cb) = &callback {
            match JsValue::from_serde(&event) {
                Ok(value) => {
                    if let Err(e) = cb.call1(&JsValue::NULL, &value) {
                        log_warn!(LogComponent::Presentation("WasmApi"), "event callback threw: {:?}", e);
                    }
                }
                Err(e) => {
                    log_warn!(LogComponent::Presentation("WasmApi"), "event serialization failed: {}", e);
                }
            }
        }
    }
}

fn scroll_into_view(container_id: &str) {
    let Some(element) = web_sys::window().and_then(|w| w.document()).and_then(|d| d.get_element_by_id(container_id))
    else {
        log_debug!(LogComponent::Presentation("WasmApi"), "no element #{} to scroll to", container_id);
        return;
    };
    let options = ScrollIntoViewOptions::new();
    options.set_behavior(ScrollBehavior::Smooth);
    options.set_block(ScrollLogicalPosition::Start);
    element.scroll_into_view_with_scroll_into_view_options(&options);
}

fn push_frame(session: &Rc<RefCell<ChartSession>>, listeners: &Rc<RefCell<Listeners>>) {
    let Some(cb) = listeners.borrow().on_frame.clone() else {
        return;
    };
    let frame = session.borrow_mut().frame();
    match JsValue::from_serde(&frame) {
        Ok(value) => {
            if let Err(e) = cb.call1(&JsValue::NULL, &value) {
                log_warn!(LogComponent::Presentation("WasmApi"), "frame callback threw: {:?}", e);
            }
        }
        Err(e) => {
            log_warn!(LogComponent::Presentation("WasmApi"), "frame serialization failed: {}", e);
        }
    }
}

#[wasm_bindgen]
pub struct BreakoutChartApi {
    container_id: String,
    session: Rc<RefCell<ChartSession>>,
    queue: EventQueue,
    listeners: Rc<RefCell<Listeners>>,
    driver: RefCell<Option<AnimationDriver>>,
}

#[wasm_bindgen]
impl BreakoutChartApi {
    /// `kind` is one of `historical`, `daily`, `hourly`, `monthly`, `previous`;
    /// `config_json` optionally overrides any subset of the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: String, kind: &str, config_json: Option<String>) -> Result<BreakoutChartApi, JsValue> {
        let kind = ChartKind::from_str(kind)
            .map_err(|_| js_error(ChartError::InvalidConfig(format!("unknown chart kind '{}'", kind))))?;
        let config = match config_json {
            Some(json) => EngineConfig::from_json(&json).map_err(js_error)?,
            None => EngineConfig::default(),
        };

        let queue: EventQueue = Rc::new(RefCell::new(Vec::new()));
        let mut session = ChartSession::new(kind, config);
        let sink = queue.clone();
        session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        Ok(Self {
            container_id,
            session: Rc::new(RefCell::new(session)),
            queue,
            listeners: Rc::new(RefCell::new(Listeners::default())),
            driver: RefCell::new(None),
        })
    }

    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, callback: js_sys::Function) {
        self.listeners.borrow_mut().on_event = Some(callback);
    }

    /// Called with a fresh frame snapshot whenever the timeline advances
    #[wasm_bindgen(js_name = onFrame)]
    pub fn on_frame(&self, callback: js_sys::Function) {
        self.listeners.borrow_mut().on_frame = Some(callback);
    }

    #[wasm_bindgen(js_name = loadSeries)]
    pub fn load_series(&self, historical_json: &str, future_json: &str) -> Result<(), JsValue> {
        self.stop_driver();
        let result = self.session.borrow_mut().load_series_json(historical_json, future_json, now_ms());
        self.flush();
        result.map_err(js_error)
    }

    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&self, width: f64, height: f64) {
        self.session.borrow_mut().set_viewport(width, height);
    }

    #[wasm_bindgen(js_name = setSelectionEnabled)]
    pub fn set_selection_enabled(&self, enabled: bool) {
        self.session.borrow_mut().set_selection_enabled(enabled);
    }

    /// `null`/`undefined` stops the reveal; a new token restarts it
    #[wasm_bindgen(js_name = setFeedback)]
    pub fn set_feedback(&self, token: Option<f64>) {
        let token = token.map(|t| t as u64);
        let outcome = self.session.borrow_mut().set_feedback(token, now_ms());
        match outcome {
            Some(StartOutcome::Started { generation }) => self.drive(generation),
            Some(StartOutcome::Duplicate) => {}
            None => self.stop_driver(),
        }
        self.flush();
    }

    #[wasm_bindgen(js_name = startReveal)]
    pub fn start_reveal(&self, token: f64) -> bool {
        let outcome = self.session.borrow_mut().start_reveal(token as u64, now_ms());
        self.flush();
        match outcome {
            StartOutcome::Started { generation } => {
                self.drive(generation);
                true
            }
            StartOutcome::Duplicate => false,
        }
    }

    pub fn pause(&self) -> bool {
        let changed = self.session.borrow_mut().pause(now_ms());
        self.flush();
        changed
    }

    pub fn resume(&self) -> bool {
        let changed = self.session.borrow_mut().resume(now_ms());
        self.flush();
        changed
    }

    pub fn reset(&self) {
        self.stop_driver();
        self.session.borrow_mut().reset(now_ms());
        self.flush();
    }

    pub fn frame(&self) -> Result<JsValue, JsValue> {
        let frame = self.session.borrow_mut().frame();
        to_js(&frame)
    }

    pub fn summary(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.borrow().summary())
    }

    /// Map a click in client coordinates; returns the outcome as a plain object
    pub fn click(&self, client_x: f64, client_y: f64) -> Result<JsValue, JsValue> {
        let bounds = self.bounds();
        let outcome = self.session.borrow_mut().handle_click(PointerPosition { client_x, client_y }, bounds);
        self.flush();
        to_js(&outcome)
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, client_x: f64, client_y: f64) {
        let bounds = self.bounds();
        self.session.borrow_mut().pointer_down(PointerPosition { client_x, client_y }, bounds);
    }

    /// Returns the CSS cursor for the pointer position
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, client_x: f64, client_y: f64) -> String {
        let bounds = self.bounds();
        let cursor = self.session.borrow_mut().pointer_move(PointerPosition { client_x, client_y }, bounds);
        cursor.as_ref().to_string()
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self, client_x: f64, client_y: f64) -> Result<JsValue, JsValue> {
        let bounds = self.bounds();
        let outcome = self.session.borrow_mut().pointer_up(PointerPosition { client_x, client_y }, bounds);
        self.flush();
        to_js(&outcome)
    }

    pub fn generation(&self) -> f64 {
        self.session.borrow().generation() as f64
    }
}

impl BreakoutChartApi {
    fn flush(&self) {
        deliver(&self.queue, &self.listeners, &self.container_id);
    }

    fn stop_driver(&self) {
        self.driver.replace(None);
    }

    fn drive(&self, generation: u64) {
        // Old loop first, so its pending callback is cancelled before the new one runs
        self.stop_driver();
        let session = self.session.clone();
        let queue = self.queue.clone();
        let listeners = self.listeners.clone();
        let container_id = self.container_id.clone();
        let driver = AnimationDriver::spawn(generation, move |generation, now| {
            let outcome = session.borrow_mut().tick(generation, now);
            deliver(&queue, &listeners, &container_id);
            if outcome != TickOutcome::Stale {
                push_frame(&session, &listeners);
            }
            outcome
        });
        self.driver.replace(Some(driver));
    }

    fn bounds(&self) -> ElementBounds {
        web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&self.container_id))
            .map(|el| {
                let rect = el.get_bounding_client_rect();
                ElementBounds { left: rect.left(), top: rect.top() }
            })
            .unwrap_or_default()
    }
}

/// Canonicalize a JSON array of bars without building a chart
#[wasm_bindgen(js_name = normalizeSeries)]
pub fn normalize_series(json: &str) -> Result<JsValue, JsValue> {
    let raw = parse_series_payload(json).map_err(js_error)?;
    to_js(&normalize(&raw, 0))
}
