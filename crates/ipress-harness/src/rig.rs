//! Fixture: one controller bound to one element on a [`SimHost`].

use std::cell::RefCell;
use std::rc::Rc;

use ipress_core::{
    CancelReason, ClickVerdict, GestureEvent, GesturePhase, PointerKind, PressConfig,
    PressController,
};

use crate::sim::{Rect, SimElement, SimEvent, SimHost};

/// Gesture event as seen by a consumer of the simulated host.
pub type SimGesture = GestureEvent<SimElement, SimEvent>;

/// Bounds of the element a [`PressRig`] binds to.
pub const PRESS_TARGET: Rect = Rect::new(0.0, 0.0, 200.0, 200.0);

/// Shared record of every gesture a consumer received.
#[derive(Debug, Clone, Default)]
pub struct GestureLog {
    events: Rc<RefCell<Vec<SimGesture>>>,
}

impl GestureLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumer callback that appends to this log.
    #[must_use]
    pub fn callback(&self) -> impl Fn(&SimGesture) + 'static {
        let events = Rc::clone(&self.events);
        move |event| events.borrow_mut().push(event.clone())
    }

    #[must_use]
    pub fn events(&self) -> Vec<SimGesture> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<SimGesture> {
        self.events.borrow().last().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    #[must_use]
    pub fn phases(&self) -> Vec<GesturePhase> {
        self.events.borrow().iter().map(|e| e.phase).collect()
    }

    /// `(phase, reason)` pairs, the usual shape for assertions.
    #[must_use]
    pub fn summary(&self) -> Vec<(GesturePhase, Option<CancelReason>)> {
        self.events
            .borrow()
            .iter()
            .map(|e| (e.phase, e.reason))
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// A `<div>` at [`PRESS_TARGET`] under `<body>`, bound to a controller that
/// logs into [`PressRig::log`].
#[derive(Debug)]
pub struct PressRig {
    pub host: SimHost,
    pub log: GestureLog,
    pub controller: PressController<SimHost>,
    pub element: SimElement,
}

impl PressRig {
    #[must_use]
    pub fn new(config: PressConfig) -> Self {
        Self::on_host(SimHost::new(), config)
    }

    /// Build on a prepared host (capabilities, extra elements).
    #[must_use]
    pub fn on_host(host: SimHost, config: PressConfig) -> Self {
        let element = host.append(host.body(), "div");
        host.set_rect(element, Some(PRESS_TARGET));
        let log = GestureLog::new();
        let controller = PressController::new(host.clone(), log.callback(), config);
        Self {
            host,
            log,
            controller,
            element,
        }
    }

    /// Pointer event aimed at the bound element.
    #[must_use]
    pub fn pointer(&self, kind: PointerKind, x: f64, y: f64) -> SimEvent {
        SimEvent::pointer(kind, x, y).on(self.element)
    }

    /// Pointer event of the same kind as the last down, for moves and ups.
    fn follow_up(&self, x: f64, y: f64) -> SimEvent {
        let kind = self
            .log
            .events()
            .iter()
            .rev()
            .find(|e| e.phase == GesturePhase::Start)
            .map_or(PointerKind::Mouse, |e| e.pointer);
        SimEvent::pointer(kind, x, y).with_target(Some(self.element))
    }

    pub fn down(&self, kind: PointerKind, x: f64, y: f64) -> SimEvent {
        let event = self.pointer(kind, x, y);
        self.controller.intake_down(&event);
        event
    }

    pub fn down_with(&self, event: &SimEvent) {
        self.controller.intake_down(event);
    }

    pub fn move_to(&self, x: f64, y: f64) -> SimEvent {
        let event = self.follow_up(x, y);
        self.host.pointer_move(&event);
        event
    }

    pub fn up(&self, x: f64, y: f64) -> SimEvent {
        let event = self.follow_up(x, y);
        self.host.pointer_up(&event);
        event
    }

    /// Mouse click at a point, as the browser synthesizes after an up.
    pub fn click(&self, x: f64, y: f64) -> (ClickVerdict, SimEvent) {
        let event = SimEvent::mouse(x, y).on(self.element);
        let verdict = self.controller.intake_click(&event);
        (verdict, event)
    }

    /// Full tap: down, up at the same point, then a microtask checkpoint.
    pub fn tap(&self, kind: PointerKind, x: f64, y: f64) {
        self.down(kind, x, y);
        self.up(x, y);
        self.settle();
    }

    /// Microtask checkpoint.
    pub fn settle(&self) {
        self.host.drain_microtasks();
    }
}
