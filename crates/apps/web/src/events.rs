//! Deferred delivery of session events to page callbacks.
//!
//! Subscribers inside the session only queue events. They are handed to the
//! page once the session borrow has been released, so a callback may call
//! back into any exported function.

use std::cell::RefCell;

use foundation::Position;
use navigation::HeadingSample;
use session::WindowState;
use wasm_bindgen::JsValue;

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum HostEvent {
    Position(Position),
    Heading(HeadingSample),
    Window(WindowState),
}

#[derive(Default)]
struct Callbacks {
    position: Vec<js_sys::Function>,
    heading: Vec<js_sys::Function>,
    window: Vec<js_sys::Function>,
}

thread_local! {
    static PENDING: RefCell<Vec<HostEvent>> = const { RefCell::new(Vec::new()) };
    static CALLBACKS: RefCell<Callbacks> = RefCell::new(Callbacks::default());
}

pub(crate) fn enqueue(event: HostEvent) {
    PENDING.with(|q| q.borrow_mut().push(event));
}

pub(crate) fn on_position(callback: js_sys::Function) {
    CALLBACKS.with(|c| c.borrow_mut().position.push(callback));
}

pub(crate) fn on_heading(callback: js_sys::Function) {
    CALLBACKS.with(|c| c.borrow_mut().heading.push(callback));
}

pub(crate) fn on_window(callback: js_sys::Function) {
    CALLBACKS.with(|c| c.borrow_mut().window.push(callback));
}

/// Drains the queue in arrival order, including events queued by `deliver`
/// itself, without holding any borrow while it runs.
fn drain_with(mut deliver: impl FnMut(HostEvent)) {
    loop {
        let batch = PENDING.with(|q| std::mem::take(&mut *q.borrow_mut()));
        if batch.is_empty() {
            break;
        }
        for event in batch {
            deliver(event);
        }
    }
}

/// Hands every queued event to the registered page callbacks.
pub(crate) fn flush() {
    drain_with(dispatch);
}

fn dispatch(event: HostEvent) {
    let opt = |v: Option<f64>| v.map(JsValue::from_f64).unwrap_or(JsValue::NULL);
    match event {
        HostEvent::Position(p) => {
            for cb in CALLBACKS.with(|c| c.borrow().position.clone()) {
                let result = cb.call3(
                    &JsValue::NULL,
                    &JsValue::from_f64(p.latitude),
                    &JsValue::from_f64(p.longitude),
                    &JsValue::from_f64(p.accuracy_m),
                );
                if let Err(error) = result {
                    tracing::warn!(?error, "position callback failed");
                }
            }
        }
        HostEvent::Heading(s) => {
            for cb in CALLBACKS.with(|c| c.borrow().heading.clone()) {
                let result = cb.call3(
                    &JsValue::NULL,
                    &JsValue::from_f64(s.heading_deg),
                    &opt(s.bearing_deg),
                    &opt(s.arrow_angle_deg),
                );
                if let Err(error) = result {
                    tracing::warn!(?error, "heading callback failed");
                }
            }
        }
        HostEvent::Window(state) => {
            for cb in CALLBACKS.with(|c| c.borrow().window.clone()) {
                let result = cb.call1(&JsValue::NULL, &JsValue::from_str(&format!("{state:?}")));
                if let Err(error) = result {
                    tracing::warn!(?error, "window callback failed");
                }
            }
        }
    }
}
