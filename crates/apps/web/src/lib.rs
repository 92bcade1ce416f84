use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use formats::{FeatureSource, parse_search_response};
use foundation::math::LonLat;
use foundation::{Millis, Position};
use navigation::{DeviceProfile, TrackingPlan, acquire_seed, check_access};
use session::{App, AppConfig, LocaleCatalog, WindowKind, default_prefs_store};

mod browser;
mod events;
use browser::{BrowserGeolocation, BrowserOrientation};
use events::HostEvent;

struct Host {
    app: App,
    geo: BrowserGeolocation,
    orientation: BrowserOrientation,
}

thread_local! {
    static HOST: RefCell<Option<Host>> = const { RefCell::new(None) };
}

pub(crate) fn log_error(msg: &str) {
    web_sys::console::error_1(&JsValue::from_str(msg));
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn now() -> Millis {
    Millis::from_f64(js_sys::Date::now())
}

/// Runs `f` against the live session, then delivers whatever events it
/// produced to the page. Fails when `init` has not run.
fn with_host<R>(f: impl FnOnce(&mut Host) -> R) -> Result<R, JsValue> {
    let result = HOST.with(|cell| {
        let mut guard = cell
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("session busy"))?;
        let host = guard
            .as_mut()
            .ok_or_else(|| JsValue::from_str("session not initialized"))?;
        Ok(f(host))
    });
    events::flush();
    result
}

fn report(result: Result<(), JsValue>) {
    if let Err(e) = result {
        log_error(&format!("{e:?}"));
    }
}

fn user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

fn browser_language() -> Option<String> {
    web_sys::window().and_then(|w| w.navigator().language())
}

fn parse_window_kind(kind: &str) -> Result<WindowKind, String> {
    serde_json::from_value(serde_json::Value::String(kind.to_string()))
        .map_err(|_| format!("unknown window: {kind}"))
}

async fn fetch_text(url: &str) -> Result<String, JsValue> {
    let resp = Request::get(url).send().await.map_err(js_err)?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!(
            "{url}: HTTP {}",
            resp.status()
        )));
    }
    resp.text().await.map_err(js_err)
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Creates the session. `config_json` may be empty or a partial config.
#[wasm_bindgen]
pub fn init(config_json: &str) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        AppConfig::default()
    } else {
        AppConfig::from_json_str(config_json).map_err(js_err)?
    };
    let device = DeviceProfile::from_user_agent(&user_agent());
    let mut app = App::new(config, device, default_prefs_store());
    app.subscribe_positions(|p: &Position| events::enqueue(HostEvent::Position(*p)));
    app.subscribe_windows(|w| events::enqueue(HostEvent::Window(*w)));

    let geo = BrowserGeolocation::new(
        |fix: Position| report(with_host(|h| h.app.handle_fix(fix)).map(|_| ())),
        |err| report(with_host(|h| h.app.handle_watch_error(err))),
    );
    let orientation = BrowserOrientation::new(|ev| {
        report(with_host(|h| h.app.handle_orientation(&ev)).map(|_| ()))
    });

    HOST.with(|cell| {
        *cell.borrow_mut() = Some(Host {
            app,
            geo,
            orientation,
        });
    });
    Ok(())
}

/// Loads the message catalog (`{"en": {...}, "pl": {...}}`) and returns the
/// resolved initial locale.
#[wasm_bindgen]
pub fn load_locales(messages_json: &str) -> Result<String, JsValue> {
    let catalog = LocaleCatalog::from_messages_json(messages_json).map_err(js_err)?;
    let language = browser_language();
    with_host(|h| h.app.load_locales(catalog, language.as_deref()).to_string())
}

#[wasm_bindgen]
pub fn set_locale(locale: &str) -> Result<bool, JsValue> {
    with_host(|h| h.app.set_locale(locale))?.map_err(js_err)
}

#[wasm_bindgen]
pub fn navigate(path: &str) -> Result<String, JsValue> {
    with_host(|h| format!("{:?}", h.app.navigate(path, now())))
}

/// Runs the one-shot accuracy check and returns the decision as JSON.
#[wasm_bindgen]
pub async fn request_access() -> Result<String, JsValue> {
    let (cfg, device) = with_host(|h| (h.app.config().access.clone(), h.app.device()))?;
    let geo = BrowserGeolocation::detached();
    let decision = check_access(&geo, &cfg, device).await;
    let json = serde_json::to_string(&decision).map_err(js_err)?;
    with_host(|h| h.app.apply_access(decision))?;
    Ok(json)
}

#[wasm_bindgen]
pub fn start_tracking() -> Result<(), JsValue> {
    match with_host(|h| h.app.tracking_plan())? {
        TrackingPlan::Watch => with_host(|h| h.app.watch(&mut h.geo))?
            .map(|_| ())
            .map_err(js_err),
        TrackingPlan::Simulate => {
            let cfg = with_host(|h| h.app.config().simulator.clone())?;
            spawn_local(async move {
                let geo = BrowserGeolocation::detached();
                let seed = acquire_seed(&geo, &cfg).await;
                report(with_host(|h| {
                    h.app.begin_simulation(seed, now());
                }));
            });
            Ok(())
        }
    }
}

#[wasm_bindgen]
pub fn stop_tracking() -> Result<(), JsValue> {
    with_host(|h| h.app.stop_tracking(&mut h.geo))
}

/// Starts the compass. `lat`/`lon`, when both given, override the configured
/// target.
#[wasm_bindgen]
pub fn start_heading(lat: Option<f64>, lon: Option<f64>) -> Result<bool, JsValue> {
    let target = lat.zip(lon).map(|(lat, lon)| LonLat::new(lon, lat));
    with_host(|h| {
        let started = h.app.start_heading(target, &mut h.orientation);
        if started {
            // Stopping drops heading subscribers, so hook the queue per start.
            h.app
                .subscribe_headings(|s| events::enqueue(HostEvent::Heading(*s)));
        }
        started
    })
}

#[wasm_bindgen]
pub fn stop_heading() -> Result<(), JsValue> {
    with_host(|h| h.app.stop_heading(&mut h.orientation))
}

#[wasm_bindgen]
pub fn set_mode(dark: bool) -> Result<String, JsValue> {
    with_host(|h| format!("{:?}", h.app.set_mode(dark, now())))
}

#[wasm_bindgen]
pub fn set_viewport(width_px: f64, height_px: f64) -> Result<(), JsValue> {
    with_host(|h| h.app.set_viewport(width_px, height_px))
}

#[wasm_bindgen]
pub fn center_on(lat: f64, lon: f64, zoom: Option<f64>, offset_px: f64) -> Result<(), JsValue> {
    with_host(|h| h.app.center_on(lat, lon, zoom, offset_px, now()))
}

#[wasm_bindgen]
pub fn center_on_position(zoom: Option<f64>, offset_px: f64) -> Result<bool, JsValue> {
    with_host(|h| h.app.center_on_position(zoom, offset_px, now()))
}

/// Fetches a local GeoJSON resource and shows its first feature.
#[wasm_bindgen]
pub fn load_geometry(url: String) {
    spawn_local(async move {
        let body = match fetch_text(&url).await {
            Ok(body) => body,
            Err(err) => {
                log_error(&format!("Failed to fetch geometry: {err:?}"));
                return;
            }
        };
        report(with_host(|h| {
            if h.app.show_geometry(&body, FeatureSource::Local).is_some() {
                h.app.fit_overlay(now());
            }
        }));
    });
}

/// Place-name search. Resolves to whether a polygon was shown.
#[wasm_bindgen]
pub async fn search_place(query: String) -> Result<bool, JsValue> {
    let url = with_host(|h| h.app.config().search.request_url(&query))?;
    let body = fetch_text(&url).await?;
    let Some(feature) = parse_search_response(&body) else {
        return Ok(false);
    };
    with_host(|h| {
        h.app.show_feature(&feature);
        h.app.fit_overlay(now());
        true
    })
}

#[wasm_bindgen]
pub fn clear_overlay() -> Result<(), JsValue> {
    with_host(|h| h.app.clear_overlay())
}

#[wasm_bindgen]
pub fn open_window(kind: &str) -> Result<bool, JsValue> {
    let kind = parse_window_kind(kind).map_err(js_err)?;
    with_host(|h| h.app.open_window(kind, now()))
}

#[wasm_bindgen]
pub fn close_window() -> Result<bool, JsValue> {
    with_host(|h| h.app.close_window())
}

#[wasm_bindgen]
pub fn auto_open_project_info() -> Result<bool, JsValue> {
    with_host(|h| h.app.auto_open_project_info(now()))
}

#[wasm_bindgen]
pub fn dismiss_project_info() -> Result<(), JsValue> {
    with_host(|h| h.app.dismiss_project_info())?.map_err(js_err)
}

/// Advances every timer and animation to the current time. Call once per
/// animation frame.
#[wasm_bindgen]
pub fn tick() -> Result<bool, JsValue> {
    with_host(|h| h.app.tick(now()))
}

/// Next wall-clock time (ms since epoch) at which `tick` has work, if any.
#[wasm_bindgen]
pub fn poll_at() -> Result<Option<f64>, JsValue> {
    with_host(|h| h.app.poll_at().map(|t| t.as_u64() as f64))
}

#[wasm_bindgen]
pub fn is_animating() -> Result<bool, JsValue> {
    with_host(|h| h.app.is_animating())
}

#[wasm_bindgen]
pub fn snapshot() -> Result<String, JsValue> {
    let snap = with_host(|h| h.app.snapshot(now()))?;
    serde_json::to_string(&snap).map_err(js_err)
}

/// `callback(lat, lon, accuracyM)`.
#[wasm_bindgen]
pub fn on_position(callback: js_sys::Function) {
    events::on_position(callback);
}

/// `callback(headingDeg, bearingDeg, arrowAngleDeg)`.
#[wasm_bindgen]
pub fn on_heading(callback: js_sys::Function) {
    events::on_heading(callback);
}

/// `callback(windowState)`.
#[wasm_bindgen]
pub fn on_window(callback: js_sys::Function) {
    events::on_window(callback);
}
