#![forbid(unsafe_code)]

//! Browser [`Host`] over `web-sys`.
//!
//! Event shapes are read through `Reflect` so pointer, mouse, and touch
//! events share one reader. Listener kinds map onto pointer events when the
//! page exposes `PointerEvent`, else onto mouse and touch equivalents:
//!
//! | Kind | Pointer events | Fallback |
//! |------|----------------|----------|
//! | Move | `pointermove` | `mousemove`, `touchmove` |
//! | Up | `pointerup` | `mouseup`, `touchend` |
//! | Cancel | `pointercancel` | `touchcancel` |
//! | LostCapture | `lostpointercapture` | (none) |
//! | Resize | `resize` | `resize` |
//! | Scroll | `scroll` (capture) | `scroll` (capture) |

use std::rc::Rc;

use ipress_core::event::Modifiers;
use ipress_core::host::{
    EventRecord, Host, HostClock, HostDom, HostTasks, IdleDeadline, IdleTask, ListenKind,
    ListenTarget, Listener, Overflow, OverflowStyle, ScrollMetrics, SelectionState, Task,
};
use ipress_core::{CancelScope, HostError};
use js_sys::Reflect;
use tracing::trace;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    AddEventListenerOptions, Document, Element, Event, EventTarget, IdleRequestOptions,
    Performance, Window,
};

struct WebInner {
    window: Window,
    document: Document,
    performance: Option<Performance>,
    pointer_events: bool,
}

/// Handle to the page's window and document.
#[derive(Clone)]
pub struct WebHost {
    inner: Rc<WebInner>,
}

impl core::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebHost")
            .field("pointer_events", &self.inner.pointer_events)
            .finish_non_exhaustive()
    }
}

impl WebHost {
    /// The current window and document, or `None` outside a browser page
    /// (workers, server-side rendering).
    #[must_use]
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        let pointer_events = has(window.as_ref(), "PointerEvent");
        let performance = window.performance();
        Some(Self {
            inner: Rc::new(WebInner {
                window,
                document,
                performance,
                pointer_events,
            }),
        })
    }

    /// Whether the page exposes `PointerEvent`.
    #[must_use]
    pub fn pointer_events(&self) -> bool {
        self.inner.pointer_events
    }

    /// Native event name for the down intake.
    #[must_use]
    pub fn down_event_name(&self) -> &'static str {
        if self.inner.pointer_events {
            "pointerdown"
        } else {
            "mousedown"
        }
    }

    fn event_names(&self, kind: ListenKind) -> &'static [&'static str] {
        match (kind, self.inner.pointer_events) {
            (ListenKind::Move, true) => &["pointermove"],
            (ListenKind::Move, false) => &["mousemove", "touchmove"],
            (ListenKind::Up, true) => &["pointerup"],
            (ListenKind::Up, false) => &["mouseup", "touchend"],
            (ListenKind::Cancel, true) => &["pointercancel"],
            (ListenKind::Cancel, false) => &["touchcancel"],
            (ListenKind::LostCapture, true) => &["lostpointercapture"],
            (ListenKind::LostCapture, false) => &[],
            (ListenKind::Resize, _) => &["resize"],
            (ListenKind::Scroll, _) => &["scroll"],
        }
    }

    fn event_target(&self, target: &ListenTarget<Element>) -> EventTarget {
        match target {
            ListenTarget::Window => self.inner.window.clone().into(),
            ListenTarget::Element(element) => element.clone().into(),
        }
    }
}

fn has(obj: &JsValue, key: &str) -> bool {
    Reflect::has(obj, &JsValue::from_str(key)).unwrap_or(false)
}

fn get(obj: &JsValue, key: &str) -> Option<JsValue> {
    let value = Reflect::get(obj, &JsValue::from_str(key)).ok()?;
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    }
}

fn get_f64(obj: &JsValue, key: &str) -> Option<f64> {
    get(obj, key)?.as_f64()
}

fn get_bool(obj: &JsValue, key: &str) -> bool {
    get(obj, key).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn get_i32(obj: &JsValue, key: &str) -> Option<i32> {
    let n = get_f64(obj, key)?;
    (n.is_finite() && n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX))
        .then_some(n as i32)
}

fn get_i16(obj: &JsValue, key: &str) -> Option<i16> {
    get_i32(obj, key).and_then(|n| i16::try_from(n).ok())
}

/// `clientX`/`clientY` of every entry in a `TouchList`-like field.
fn touch_points(event: &JsValue, key: &str) -> Option<Vec<(f64, f64)>> {
    let list = get(event, key)?;
    let len = get_f64(&list, "length").unwrap_or(0.0) as u32;
    let points = (0..len)
        .filter_map(|index| Reflect::get_u32(&list, index).ok())
        .filter_map(|touch| Some((get_f64(&touch, "clientX")?, get_f64(&touch, "clientY")?)))
        .collect();
    Some(points)
}

fn rejected(err: JsValue) -> HostError {
    HostError::Rejected(
        err.as_string()
            .or_else(|| get(&err, "message").and_then(|m| m.as_string()))
            .unwrap_or_else(|| "host call threw".to_owned()),
    )
}

/// Milliseconds since the page's time origin, the clock behind
/// `Event.timeStamp`.
impl HostClock for WebHost {
    fn now_ms(&self) -> f64 {
        self.inner
            .performance
            .as_ref()
            .map_or_else(js_sys::Date::now, Performance::now)
    }
}

impl HostDom for WebHost {
    type Element = Element;

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name()
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn parent_element(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn document_element(&self) -> Option<Element> {
        self.inner.document.document_element()
    }

    fn scrolling_element(&self) -> Option<Element> {
        self.inner.document.scrolling_element()
    }

    fn overflow(&self, element: &Element) -> Option<OverflowStyle> {
        let style = self.inner.window.get_computed_style(element).ok()??;
        let axis = |name: &str| {
            style
                .get_property_value(name)
                .map(|value| Overflow::parse(&value))
                .unwrap_or_default()
        };
        Some(OverflowStyle {
            x: axis("overflow-x"),
            y: axis("overflow-y"),
        })
    }

    fn scroll_metrics(&self, element: &Element) -> ScrollMetrics {
        ScrollMetrics {
            scroll_width: element.scroll_width(),
            scroll_height: element.scroll_height(),
            client_width: element.client_width(),
            client_height: element.client_height(),
        }
    }

    fn element_from_point(&self, x: f64, y: f64) -> Result<Option<Element>, HostError> {
        if !has(self.inner.document.as_ref(), "elementFromPoint") {
            return Err(HostError::Unsupported("elementFromPoint"));
        }
        Ok(self.inner.document.element_from_point(x as f32, y as f32))
    }

    fn contains(&self, root: &Element, node: &Element) -> bool {
        let node: &web_sys::Node = node;
        root.contains(Some(node))
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        Some(self.inner.window.device_pixel_ratio())
    }

    fn selection(&self) -> Option<SelectionState> {
        let selection = self.inner.window.get_selection().ok()??;
        Some(SelectionState {
            range_count: selection.range_count(),
            is_collapsed: selection.is_collapsed(),
            anchor_offset: selection.anchor_offset(),
            focus_offset: selection.focus_offset(),
            text_len: selection.to_string().length() as usize,
        })
    }
}

impl HostTasks for WebHost {
    fn has_idle_callback(&self) -> bool {
        has(self.inner.window.as_ref(), "requestIdleCallback")
    }

    fn request_idle_callback(&self, timeout_ms: u32, task: IdleTask) -> Result<u32, HostError> {
        let callback = Closure::once_into_js(move |deadline: web_sys::IdleDeadline| {
            task(IdleDeadline {
                did_timeout: deadline.did_timeout(),
                time_remaining_ms: deadline.time_remaining(),
            });
        });
        let options = IdleRequestOptions::new();
        options.set_timeout(timeout_ms);
        self.inner
            .window
            .request_idle_callback_with_options(callback.unchecked_ref(), &options)
            .map_err(rejected)
    }

    fn cancel_idle_callback(&self, handle: u32) {
        self.inner.window.cancel_idle_callback(handle);
    }

    fn set_timeout(&self, delay_ms: u32, task: Task) -> Result<u32, HostError> {
        let callback = Closure::once_into_js(move || task());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        let handle = self
            .inner
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
            .map_err(rejected)?;
        u32::try_from(handle).map_err(|_| HostError::Rejected(format!("timer handle {handle}")))
    }

    fn clear_timeout(&self, handle: u32) {
        if let Ok(handle) = i32::try_from(handle) {
            self.inner.window.clear_timeout_with_handle(handle);
        }
    }

    fn has_microtask_queue(&self) -> bool {
        has(self.inner.window.as_ref(), "queueMicrotask")
    }

    fn queue_microtask(&self, task: Task) -> Result<(), HostError> {
        let callback = Closure::once_into_js(move || task());
        self.inner.window.queue_microtask(callback.unchecked_ref());
        Ok(())
    }

    fn resolve_then(&self, task: Task) -> Result<(), HostError> {
        wasm_bindgen_futures::spawn_local(async move { task() });
        Ok(())
    }
}

impl Host for WebHost {
    type Event = Event;

    fn read_event(&self, event: &Event) -> EventRecord<Element> {
        let raw: &JsValue = event.as_ref();
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::ALT, get_bool(raw, "altKey"));
        modifiers.set(Modifiers::CTRL, get_bool(raw, "ctrlKey"));
        modifiers.set(Modifiers::META, get_bool(raw, "metaKey"));
        modifiers.set(Modifiers::SHIFT, get_bool(raw, "shiftKey"));

        EventRecord {
            pointer_type: get(raw, "pointerType").and_then(|v| v.as_string()),
            pointer_id: get_i32(raw, "pointerId"),
            client: get_f64(raw, "clientX").zip(get_f64(raw, "clientY")),
            touches: touch_points(raw, "touches"),
            changed_touches: touch_points(raw, "changedTouches"),
            button: get_i16(raw, "button"),
            modifiers,
            time_stamp: Some(event.time_stamp()),
            target: event.target().and_then(|t| t.dyn_into::<Element>().ok()),
            current_target: event
                .current_target()
                .and_then(|t| t.dyn_into::<Element>().ok()),
        }
    }

    fn prevent_default(&self, event: &Event) -> Result<(), HostError> {
        event.prevent_default();
        Ok(())
    }

    fn stop_propagation(&self, event: &Event) -> Result<(), HostError> {
        event.stop_propagation();
        Ok(())
    }

    fn set_pointer_capture(&self, element: &Element, pointer_id: i32) -> Result<(), HostError> {
        if !has(element.as_ref(), "setPointerCapture") {
            return Err(HostError::Unsupported("setPointerCapture"));
        }
        element.set_pointer_capture(pointer_id).map_err(rejected)
    }

    fn listen(
        &self,
        target: ListenTarget<Element>,
        kind: ListenKind,
        scope: &CancelScope,
        listener: Listener<Event>,
    ) -> Result<(), HostError> {
        if scope.is_cancelled() {
            return Ok(());
        }
        let names = self.event_names(kind);
        if names.is_empty() {
            trace!(?kind, "no native event for listener kind");
            return Ok(());
        }

        let event_target = self.event_target(&target);
        let capture = kind.capture();
        let listener: Rc<dyn Fn(&Event)> = Rc::from(listener);
        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        options.set_capture(capture);

        for &name in names {
            let shared = Rc::clone(&listener);
            let closure = Closure::<dyn Fn(Event)>::new(move |event: Event| shared(&event));
            event_target
                .add_event_listener_with_callback_and_add_event_listener_options(
                    name,
                    closure.as_ref().unchecked_ref(),
                    &options,
                )
                .map_err(rejected)?;

            let detach_target = event_target.clone();
            scope.on_cancel(move || {
                let _ = detach_target.remove_event_listener_with_callback_and_bool(
                    name,
                    closure.as_ref().unchecked_ref(),
                    capture,
                );
                drop(closure);
            });
        }
        Ok(())
    }
}
