#![forbid(unsafe_code)]

//! `wasm-bindgen` export of the vanilla element binding.
//!
//! ```js
//! const press = new IntentPress(button, (ev) => {
//!   if (ev.phase === "intent") open();
//! }, { maxPressMs: 800 });
//! // later
//! press.destroy();
//! ```

use ipress_core::{ClickVerdict, GestureEvent, PressController};
use js_sys::{Function, JSON, Object, Reflect};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Element, Event, EventTarget};

use crate::host::WebHost;
use crate::options::parse_options;

type WebGesture = GestureEvent<Element, Event>;

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn opt_js<T: Into<JsValue>>(value: Option<T>) -> JsValue {
    value.map_or(JsValue::NULL, Into::into)
}

fn gesture_to_js(event: &WebGesture) -> JsValue {
    let obj = Object::new();
    set_js(&obj, "phase", JsValue::from_str(event.phase.as_str()));
    set_js(&obj, "pointerType", JsValue::from_str(event.pointer.as_str()));
    set_js(&obj, "target", opt_js(event.target.clone()));
    set_js(&obj, "currentTarget", opt_js(event.current_target.clone()));
    set_js(&obj, "clientX", JsValue::from_f64(event.client_x));
    set_js(&obj, "clientY", JsValue::from_f64(event.client_y));
    set_js(&obj, "timeStamp", JsValue::from_f64(event.time_stamp));
    set_js(&obj, "altKey", JsValue::from_bool(event.alt_key()));
    set_js(&obj, "ctrlKey", JsValue::from_bool(event.ctrl_key()));
    set_js(&obj, "metaKey", JsValue::from_bool(event.meta_key()));
    set_js(&obj, "shiftKey", JsValue::from_bool(event.shift_key()));
    set_js(&obj, "button", opt_js(event.button));
    set_js(&obj, "originalEvent", opt_js(event.original.clone()));
    set_js(
        &obj,
        "reason",
        opt_js(event.reason.map(|reason| reason.as_str())),
    );
    obj.into()
}

fn options_json(options: &JsValue) -> Result<String, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(String::new());
    }
    Ok(JSON::stringify(options)?.as_string().unwrap_or_default())
}

/// Native listeners on the bound element.
struct Intake {
    target: EventTarget,
    down_name: &'static str,
    down: Closure<dyn Fn(Event)>,
    click: Closure<dyn Fn(Event)>,
}

impl Intake {
    fn detach(&self) {
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            self.down_name,
            self.down.as_ref().unchecked_ref(),
            false,
        );
        let _ = self.target.remove_event_listener_with_callback_and_bool(
            "click",
            self.click.as_ref().unchecked_ref(),
            true,
        );
    }
}

/// Press-intent controller bound to one element.
///
/// `onGesture` receives a plain object per phase: `start`, then exactly one
/// of `cancel` (with `reason`) or `intent`.
#[wasm_bindgen]
pub struct IntentPress {
    controller: PressController<WebHost>,
    intake: Option<Intake>,
}

#[wasm_bindgen]
impl IntentPress {
    /// Bind to `element`. `options` is an optional plain object with the
    /// camelCase keys `slop`, `maxPressMs`, `allowModified`,
    /// `allowTextSelection`, `allowNonPrimary`, `preventDefault`,
    /// `clickGuard`, `enabled`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        element: Element,
        on_gesture: Function,
        options: JsValue,
    ) -> Result<IntentPress, JsValue> {
        let config = parse_options(&options_json(&options)?)
            .map_err(|err| JsValue::from(js_sys::Error::new(&err.to_string())))?;

        let host = WebHost::detect();
        let down_name = host
            .as_ref()
            .map_or("pointerdown", WebHost::down_event_name);
        let controller = PressController::from_host(
            host,
            move |event: &WebGesture| {
                if let Err(err) = on_gesture.call1(&JsValue::UNDEFINED, &gesture_to_js(event)) {
                    warn!(?err, phase = event.phase.as_str(), "onGesture threw");
                }
            },
            config,
        );
        if controller.is_inert() {
            debug!("no window or document; IntentPress is inert");
            return Ok(Self {
                controller,
                intake: None,
            });
        }

        let down = {
            let controller = controller.clone();
            Closure::<dyn Fn(Event)>::new(move |event: Event| controller.intake_down(&event))
        };
        let click = {
            let controller = controller.clone();
            Closure::<dyn Fn(Event)>::new(move |event: Event| {
                let verdict = controller.intake_click(&event);
                if verdict == ClickVerdict::Suppressed {
                    trace!("click suppressed after committed press");
                }
            })
        };

        let target: EventTarget = element.into();
        let down_options = AddEventListenerOptions::new();
        // preventDefault is a no-op inside a passive listener.
        down_options.set_passive(!config.prevent_default);
        target.add_event_listener_with_callback_and_add_event_listener_options(
            down_name,
            down.as_ref().unchecked_ref(),
            &down_options,
        )?;
        target.add_event_listener_with_callback_and_bool(
            "click",
            click.as_ref().unchecked_ref(),
            true,
        )?;

        Ok(Self {
            controller,
            intake: Some(Intake {
                target,
                down_name,
                down,
                click,
            }),
        })
    }

    /// Detach from the element and cancel any live press with `unmounted`.
    /// Safe to call more than once.
    pub fn destroy(&mut self) {
        if let Some(intake) = self.intake.take() {
            intake.detach();
        }
        self.controller.destroy();
    }

    /// Disabling cancels a live press with `disabled`.
    #[wasm_bindgen(js_name = setEnabled)]
    pub fn set_enabled(&self, enabled: bool) {
        self.controller.set_enabled(enabled);
    }

    #[wasm_bindgen(getter)]
    pub fn enabled(&self) -> bool {
        self.controller.is_enabled()
    }

    #[wasm_bindgen(getter)]
    pub fn destroyed(&self) -> bool {
        self.controller.is_destroyed()
    }

    /// Whether a press is between `start` and its resolution.
    #[wasm_bindgen(getter)]
    pub fn active(&self) -> bool {
        self.controller.has_active_interaction()
    }
}

impl Drop for IntentPress {
    fn drop(&mut self) {
        self.destroy();
    }
}
