//! Bindings to the browser geolocation and orientation APIs.

use foundation::Position;
use navigation::{
    EventFamily, Geolocation, GeolocationError, LocalBoxFuture, OrientationEvent,
    OrientationSource, PositionOptions, WatchId,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(inline_js = "
export function wayfarer_geolocation_available() {
    return typeof navigator !== 'undefined' && 'geolocation' in navigator;
}

export function wayfarer_current_position(highAccuracy, timeout, maximumAge) {
    return new Promise((resolve, reject) => {
        navigator.geolocation.getCurrentPosition(
            (p) => resolve({ latitude: p.coords.latitude, longitude: p.coords.longitude, accuracy: p.coords.accuracy }),
            (e) => reject({ code: e.code, message: e.message }),
            { enableHighAccuracy: highAccuracy, timeout, maximumAge },
        );
    });
}

export function wayfarer_watch_position(highAccuracy, timeout, maximumAge, onFix, onError) {
    return navigator.geolocation.watchPosition(
        (p) => onFix(p.coords.latitude, p.coords.longitude, p.coords.accuracy),
        (e) => onError(e.code, e.message || ''),
        { enableHighAccuracy: highAccuracy, timeout, maximumAge },
    );
}

export function wayfarer_clear_watch(id) {
    navigator.geolocation.clearWatch(id);
}

export function wayfarer_add_window_listener(name, handler) {
    window.addEventListener(name, handler, true);
}

export function wayfarer_remove_window_listener(name, handler) {
    window.removeEventListener(name, handler, true);
}
")]
extern "C" {
    fn wayfarer_geolocation_available() -> bool;

    #[wasm_bindgen(catch)]
    fn wayfarer_current_position(
        high_accuracy: bool,
        timeout: f64,
        maximum_age: f64,
    ) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch)]
    fn wayfarer_watch_position(
        high_accuracy: bool,
        timeout: f64,
        maximum_age: f64,
        on_fix: &js_sys::Function,
        on_error: &js_sys::Function,
    ) -> Result<u32, JsValue>;

    fn wayfarer_clear_watch(id: u32);

    #[wasm_bindgen(catch)]
    fn wayfarer_add_window_listener(name: &str, handler: &js_sys::Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    fn wayfarer_remove_window_listener(
        name: &str,
        handler: &js_sys::Function,
    ) -> Result<(), JsValue>;
}

fn get_f64(obj: &JsValue, key: &str) -> Option<f64> {
    js_sys::Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
}

fn error_from_js(value: &JsValue) -> GeolocationError {
    let code = get_f64(value, "code").unwrap_or(2.0) as u16;
    let message = js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|v| v.as_string())
        .unwrap_or_default();
    GeolocationError::from_code(code, message)
}

type FixHandler = Closure<dyn FnMut(f64, f64, f64)>;
type ErrorHandler = Closure<dyn FnMut(u16, String)>;

/// `navigator.geolocation`. Watch callbacks are wired at construction;
/// a detached instance only serves one-shot requests.
pub struct BrowserGeolocation {
    handlers: Option<(FixHandler, ErrorHandler)>,
}

impl BrowserGeolocation {
    pub fn detached() -> Self {
        Self { handlers: None }
    }

    pub fn new(
        mut on_fix: impl FnMut(Position) + 'static,
        mut on_error: impl FnMut(GeolocationError) + 'static,
    ) -> Self {
        let fix = Closure::wrap(Box::new(move |lat: f64, lon: f64, accuracy: f64| {
            on_fix(Position::new(lat, lon, accuracy));
        }) as Box<dyn FnMut(f64, f64, f64)>);
        let err = Closure::wrap(Box::new(move |code: u16, message: String| {
            on_error(GeolocationError::from_code(code, message));
        }) as Box<dyn FnMut(u16, String)>);
        Self {
            handlers: Some((fix, err)),
        }
    }
}

impl Geolocation for BrowserGeolocation {
    fn is_available(&self) -> bool {
        wayfarer_geolocation_available()
    }

    fn current_position<'a>(
        &'a self,
        options: PositionOptions,
    ) -> LocalBoxFuture<'a, Result<Position, GeolocationError>> {
        Box::pin(async move {
            if !self.is_available() {
                return Err(GeolocationError::Unavailable);
            }
            let promise = wayfarer_current_position(
                options.high_accuracy,
                options.timeout_ms as f64,
                options.max_age_ms as f64,
            )
            .map_err(|e| error_from_js(&e))?;
            let value = JsFuture::from(promise)
                .await
                .map_err(|e| error_from_js(&e))?;
            match (
                get_f64(&value, "latitude"),
                get_f64(&value, "longitude"),
                get_f64(&value, "accuracy"),
            ) {
                (Some(lat), Some(lon), Some(acc)) => Ok(Position::new(lat, lon, acc)),
                _ => Err(GeolocationError::PositionUnavailable(
                    "malformed position".to_string(),
                )),
            }
        })
    }

    fn watch_position(&mut self, options: PositionOptions) -> Result<WatchId, GeolocationError> {
        if !self.is_available() {
            return Err(GeolocationError::Unavailable);
        }
        let Some((fix, err)) = &self.handlers else {
            return Err(GeolocationError::Unavailable);
        };
        wayfarer_watch_position(
            options.high_accuracy,
            options.timeout_ms as f64,
            options.max_age_ms as f64,
            fix.as_ref().unchecked_ref(),
            err.as_ref().unchecked_ref(),
        )
        .map(WatchId)
        .map_err(|e| error_from_js(&e))
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.is_available() {
            wayfarer_clear_watch(id.0);
        }
    }
}

/// Parses a `deviceorientation*` event into the platform-neutral shape.
pub fn orientation_event_from_js(event: &JsValue) -> Option<OrientationEvent> {
    let kind = js_sys::Reflect::get(event, &JsValue::from_str("type"))
        .ok()?
        .as_string()?;
    let family = EventFamily::ALL
        .into_iter()
        .find(|f| f.event_name() == kind)?;
    let absolute = js_sys::Reflect::get(event, &JsValue::from_str("absolute"))
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    Some(OrientationEvent {
        family,
        webkit_compass_heading: get_f64(event, "webkitCompassHeading"),
        alpha: get_f64(event, "alpha"),
        absolute,
    })
}

/// Window-level orientation listeners sharing one handler.
pub struct BrowserOrientation {
    handler: Closure<dyn FnMut(JsValue)>,
}

impl BrowserOrientation {
    pub fn new(mut on_event: impl FnMut(OrientationEvent) + 'static) -> Self {
        let handler = Closure::wrap(Box::new(move |event: JsValue| {
            if let Some(ev) = orientation_event_from_js(&event) {
                on_event(ev);
            }
        }) as Box<dyn FnMut(JsValue)>);
        Self { handler }
    }
}

impl OrientationSource for BrowserOrientation {
    fn add_listener(&mut self, family: EventFamily) {
        if let Err(e) =
            wayfarer_add_window_listener(family.event_name(), self.handler.as_ref().unchecked_ref())
        {
            crate::log_error(&format!("orientation listener error: {e:?}"));
        }
    }

    fn remove_listener(&mut self, family: EventFamily) {
        if let Err(e) = wayfarer_remove_window_listener(
            family.event_name(),
            self.handler.as_ref().unchecked_ref(),
        ) {
            crate::log_error(&format!("orientation listener error: {e:?}"));
        }
    }
}
