//! Press controller: the per-interaction state machine.
//!
//! [`PressController`] turns a pointer-down and whatever follows it into
//! exactly one resolution: an `intent` (a committed press) or a `cancel`
//! with a [`CancelReason`].
//!
//! # State Machine
//!
//! ```text
//!            intake_down                      up passes every guard
//!   Idle ─────────────────▶ Live(interaction) ──────────────────────▶ Idle + intent (next microtask)
//!    ▲                         │
//!    └─────────────────────────┘  move beyond slop, scroll, resize, pointer
//!         cancel(reason)          cancel, lost capture, timeout, selection,
//!                                 hit-test, disable, destroy, supersede
//! ```
//!
//! # Invariants
//!
//! 1. At most one interaction is live. A down while one is live cancels it
//!    with `SupersededByNewInteraction` before the new `start` is emitted.
//! 2. Each interaction resolves once. Its listeners share one
//!    [`CancelScope`]; resolving cancels the scope, which detaches them all.
//! 3. Every listener checks that its interaction is still the live one, so a
//!    stale listener can never act on a newer interaction.
//! 4. The click [`GuardToken`] is recorded synchronously at commit, before
//!    the `intent` is delivered.
//! 5. Consumer callbacks never run while controller state is borrowed, so a
//!    callback may call back into the controller.
//!
//! # Failure Modes
//!
//! - A panicking consumer callback is caught and discarded.
//! - Best-effort platform calls (pointer capture, `preventDefault`,
//!   `stopPropagation`) that fail are ignored.
//! - If the host refuses a listener the interaction stays live until a later
//!   down supersedes it or the controller is disabled or destroyed.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use web_time::Instant;

use crate::cancel::CancelScope;
use crate::click_guard::{ClickVerdict, GuardToken};
use crate::config::PressConfig;
use crate::event::{CancelReason, GestureEvent, GesturePhase, Modifiers, Point, PointerKind};
use crate::facts::{self, COLLAPSED_SELECTION};
use crate::host::{EventRecord, Host, HostClock, HostDom, ListenKind, ListenTarget, Listener};
use crate::scheduler::{self, IdleHandle};

#[cfg(feature = "tracing")]
use crate::logging::{debug, trace, warn};
#[cfg(not(feature = "tracing"))]
use crate::{debug, trace, warn};

/// Latest start for the idle task that drops retained references.
const CLEANUP_IDLE_TIMEOUT_MS: u32 = 300;

/// Gesture event specialized to a host's element and event types.
pub type HostGestureEvent<H> = GestureEvent<<H as HostDom>::Element, <H as Host>::Event>;

/// Consumer callback.
pub type GestureCallback<H> = Rc<dyn Fn(&HostGestureEvent<H>)>;

type Handler<H> = fn(&Rc<Shared<H>>, &Rc<Interaction<<H as HostDom>::Element>>, &<H as Host>::Event);

/// One tracked press attempt.
struct Interaction<N> {
    id: u64,
    pointer: PointerKind,
    pointer_id: Option<i32>,
    started_at: f64,
    origin: Point,
    slop: f64,
    target: Option<N>,
    current_target: Option<N>,
    selection_at_start: String,
    scroll_parents: RefCell<Vec<N>>,
    scope: CancelScope,
    cleanup: Cell<Option<IdleHandle>>,
}

impl<N> Interaction<N> {
    /// The element the down was bound on, else the raw down target.
    fn bound_element(&self) -> Option<&N> {
        self.current_target.as_ref().or(self.target.as_ref())
    }
}

struct ControllerState<N> {
    enabled: bool,
    destroyed: bool,
    active: Option<Rc<Interaction<N>>>,
    guard: Option<GuardToken>,
    next_id: u64,
}

struct Shared<H: Host> {
    host: H,
    config: PressConfig,
    on_gesture: GestureCallback<H>,
    state: RefCell<ControllerState<H::Element>>,
}

/// Handle to one press controller.
///
/// Clones share the same controller. A controller built without a host is
/// inert: every operation is a no-op.
pub struct PressController<H: Host> {
    shared: Option<Rc<Shared<H>>>,
}

impl<H: Host> Clone for PressController<H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<H: Host> core::fmt::Debug for PressController<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Some(shared) = &self.shared else {
            return f.write_str("PressController(inert)");
        };
        let state = shared.state.borrow();
        f.debug_struct("PressController")
            .field("enabled", &state.enabled)
            .field("destroyed", &state.destroyed)
            .field("active", &state.active.as_ref().map(|a| a.id))
            .field("guard", &state.guard)
            .field("config", &shared.config)
            .finish()
    }
}

impl<H: Host> PressController<H> {
    /// Create a controller bound to `host`.
    pub fn new(
        host: H,
        on_gesture: impl Fn(&HostGestureEvent<H>) + 'static,
        config: PressConfig,
    ) -> Self {
        if let Err(err) = config.validate() {
            warn!(error = %err, "ignoring invalid slop override");
        }
        Self {
            shared: Some(Rc::new(Shared {
                host,
                on_gesture: Rc::new(on_gesture),
                state: RefCell::new(ControllerState {
                    enabled: config.enabled,
                    destroyed: false,
                    active: None,
                    guard: None,
                    next_id: 1,
                }),
                config,
            })),
        }
    }

    /// Create a controller if a host is available, else an inert one.
    pub fn from_host(
        host: Option<H>,
        on_gesture: impl Fn(&HostGestureEvent<H>) + 'static,
        config: PressConfig,
    ) -> Self {
        match host {
            Some(host) => Self::new(host, on_gesture, config),
            None => Self::inert(),
        }
    }

    /// A controller for environments without a document or window.
    #[must_use]
    pub const fn inert() -> Self {
        Self { shared: None }
    }

    /// Entry point for a native pointer/mouse-down on the bound element.
    pub fn intake_down(&self, event: &H::Event) {
        if let Some(shared) = &self.shared {
            shared.on_down(event);
        }
    }

    /// Entry point for a native click (capture phase) on the bound element.
    pub fn intake_click(&self, event: &H::Event) -> ClickVerdict {
        match &self.shared {
            Some(shared) => shared.on_click(event),
            None => ClickVerdict::Disabled,
        }
    }

    /// Cancel any live interaction with `Unmounted`, forget the guard token,
    /// and ignore all later intake. Idempotent.
    pub fn destroy(&self) {
        if let Some(shared) = &self.shared {
            shared.destroy();
        }
    }

    /// Disabling cancels a live interaction with `Disabled`.
    pub fn set_enabled(&self, enabled: bool) {
        if let Some(shared) = &self.shared {
            shared.state.borrow_mut().enabled = enabled;
            if !enabled {
                shared.cancel_active(CancelReason::Disabled, None);
            }
        }
    }

    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.shared.is_none()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.state.borrow().enabled)
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.state.borrow().destroyed)
    }

    #[must_use]
    pub fn has_active_interaction(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.state.borrow().active.is_some())
    }

    /// The guard token recorded by the most recent commit.
    #[must_use]
    pub fn guard_token(&self) -> Option<GuardToken> {
        self.shared
            .as_ref()
            .and_then(|shared| shared.state.borrow().guard)
    }
}

impl<H: Host> Shared<H> {
    fn live(&self, id: u64) -> Option<Rc<Interaction<H::Element>>> {
        self.state
            .borrow()
            .active
            .as_ref()
            .filter(|active| active.id == id)
            .cloned()
    }

    fn is_halted(&self) -> bool {
        let state = self.state.borrow();
        state.destroyed || !state.enabled
    }

    fn on_down(self: &Rc<Self>, event: &H::Event) {
        if self.is_halted() {
            return;
        }
        self.cancel_active(CancelReason::SupersededByNewInteraction, Some(event));
        // The supersede callback may have destroyed or disabled us.
        if self.is_halted() {
            return;
        }

        let record = self.host.read_event(event);
        let pointer = facts::pointer_kind(&record);

        if !self.config.allow_non_primary && !facts::is_primary_button(&record) {
            trace!(button = ?record.button, "down ignored: non-primary button");
            self.emit(&self.gesture_from(GesturePhase::Cancel, pointer, event, &record, Some(CancelReason::NonPrimary)));
            return;
        }
        if !self.config.allow_modified && facts::has_modifiers(&record) {
            trace!(modifiers = ?record.modifiers, "down ignored: modifier held");
            self.emit(&self.gesture_from(GesturePhase::Cancel, pointer, event, &record, Some(CancelReason::Modified)));
            return;
        }

        if self.config.prevent_default
            && !facts::is_probably_interactive(&self.host, record.current_target.as_ref())
            && let Err(err) = self.host.prevent_default(event)
        {
            trace!(error = %err, "preventDefault on down failed");
        }

        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            id
        };
        let bound = record.current_target.as_ref().or(record.target.as_ref());
        let selection_at_start = if self.config.allow_text_selection {
            String::new()
        } else {
            facts::selection_fingerprint(&self.host)
        };
        let interaction = Rc::new(Interaction {
            id,
            pointer,
            pointer_id: record.pointer_id,
            started_at: self.host.now_ms(),
            origin: facts::client_point(&record),
            slop: self
                .config
                .slop_for(pointer, facts::device_pixel_ratio(&self.host)),
            scroll_parents: RefCell::new(facts::scroll_parents(&self.host, bound)),
            target: record.target.clone(),
            current_target: record.current_target.clone(),
            selection_at_start,
            scope: CancelScope::new(),
            cleanup: Cell::new(None),
        });
        self.state.borrow_mut().active = Some(Rc::clone(&interaction));
        debug!(
            interaction = id,
            pointer = pointer.as_str(),
            slop = interaction.slop,
            scroll_parents = interaction.scroll_parents.borrow().len(),
            "press interaction opened"
        );

        if let (Some(element), Some(pointer_id)) =
            (interaction.current_target.as_ref(), interaction.pointer_id)
            && let Err(err) = self.host.set_pointer_capture(element, pointer_id)
        {
            trace!(error = %err, pointer_id, "pointer capture unavailable");
        }

        self.emit(&self.gesture_from(GesturePhase::Start, pointer, event, &record, None));

        self.attach_scroll_listeners(&interaction);
        self.attach_pointer_listeners(&interaction);
    }

    fn attach_scroll_listeners(self: &Rc<Self>, interaction: &Rc<Interaction<H::Element>>) {
        let parents = interaction.scroll_parents.borrow().clone();
        let targets = parents
            .into_iter()
            .map(ListenTarget::Element)
            .chain(std::iter::once(ListenTarget::Window));
        for target in targets {
            self.listen(interaction, target, ListenKind::Scroll, |shared, _, event| {
                shared.cancel_active(CancelReason::Scrolled, Some(event));
            });
        }
    }

    fn attach_pointer_listeners(self: &Rc<Self>, interaction: &Rc<Interaction<H::Element>>) {
        self.listen(interaction, ListenTarget::Window, ListenKind::Move, |shared, live, event| {
            shared.on_move(live, event);
        });
        self.listen(interaction, ListenTarget::Window, ListenKind::Up, |shared, live, event| {
            shared.on_up(live, event);
        });
        self.listen(interaction, ListenTarget::Window, ListenKind::Cancel, |shared, _, event| {
            shared.cancel_active(CancelReason::Canceled, Some(event));
        });
        self.listen(interaction, ListenTarget::Window, ListenKind::LostCapture, |shared, _, event| {
            shared.cancel_active(CancelReason::LostCapture, Some(event));
        });
        self.listen(interaction, ListenTarget::Window, ListenKind::Resize, |shared, _, event| {
            shared.cancel_active(CancelReason::Canceled, Some(event));
        });
    }

    /// Attach `handler` for the lifetime of `interaction`. The listener holds
    /// the controller weakly and only fires while `interaction` is live.
    fn listen(
        self: &Rc<Self>,
        interaction: &Interaction<H::Element>,
        target: ListenTarget<H::Element>,
        kind: ListenKind,
        handler: Handler<H>,
    ) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let id = interaction.id;
        let listener: Listener<H::Event> = Box::new(move |event| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Some(live) = shared.live(id) {
                handler(&shared, &live, event);
            }
        });
        if let Err(err) = self.host.listen(target, kind, &interaction.scope, listener) {
            warn!(error = %err, interaction = id, ?kind, "listener not attached");
        }
    }

    fn on_move(self: &Rc<Self>, interaction: &Interaction<H::Element>, event: &H::Event) {
        let point = facts::client_point(&self.host.read_event(event));
        if point.distance_sq(interaction.origin) > interaction.slop * interaction.slop {
            self.cancel_active(CancelReason::Moved, Some(event));
        }
    }

    fn on_up(self: &Rc<Self>, interaction: &Rc<Interaction<H::Element>>, event: &H::Event) {
        // An up can land beyond slop without an intervening move event.
        let record = self.host.read_event(event);
        let point = facts::client_point(&record);
        if point.distance_sq(interaction.origin) > interaction.slop * interaction.slop {
            self.cancel_active(CancelReason::Moved, Some(event));
            return;
        }

        let max_press_ms = self.config.max_press_ms;
        if max_press_ms > 0 && self.host.now_ms() - interaction.started_at > f64::from(max_press_ms) {
            self.cancel_active(CancelReason::Timeout, Some(event));
            return;
        }

        if !self.config.allow_text_selection {
            let selection = facts::selection_fingerprint(&self.host);
            if selection != interaction.selection_at_start && selection != COLLAPSED_SELECTION {
                self.cancel_active(CancelReason::Selection, Some(event));
                return;
            }
        }

        if let Some(root) = interaction.bound_element()
            && !facts::contains_point(&self.host, root, point)
        {
            self.cancel_active(CancelReason::HitTest, Some(event));
            return;
        }

        self.commit(interaction, event, &record, point);
    }

    fn commit(
        self: &Rc<Self>,
        interaction: &Rc<Interaction<H::Element>>,
        event: &H::Event,
        record: &EventRecord<H::Element>,
        point: Point,
    ) {
        {
            let mut state = self.state.borrow_mut();
            if state.active.as_ref().map(|active| active.id) != Some(interaction.id) {
                return;
            }
            state.active = None;
            state.guard = Some(GuardToken::new(self.host.now_ms(), point));
        }
        debug!(interaction = interaction.id, x = point.x, y = point.y, "press committed");

        let intent = self.gesture_from(GesturePhase::Intent, interaction.pointer, event, record, None);
        interaction.scope.cancel();
        self.reschedule_cleanup(interaction);

        let on_gesture = Rc::clone(&self.on_gesture);
        let deferral = scheduler::schedule_microtask(&self.host, move || {
            deliver(&*on_gesture, &intent);
        });
        trace!(?deferral, "intent delivery scheduled");
    }

    /// Resolve the live interaction, if any, as cancelled. Idempotent.
    fn cancel_active(self: &Rc<Self>, reason: CancelReason, event: Option<&H::Event>) {
        let Some(interaction) = self.state.borrow_mut().active.take() else {
            return;
        };
        debug!(interaction = interaction.id, %reason, "press cancelled");

        let gesture = match event {
            Some(event) => {
                let record = self.host.read_event(event);
                self.gesture_from(GesturePhase::Cancel, interaction.pointer, event, &record, Some(reason))
            }
            None => self.synthetic_cancel(&interaction, reason),
        };
        self.emit(&gesture);

        interaction.scope.cancel();
        self.reschedule_cleanup(&interaction);
    }

    /// Schedule idle release of the references an interaction retains,
    /// replacing any cleanup already pending.
    ///
    /// The task holds only a weak handle. Resolution takes the interaction
    /// out of `active` and listeners keep just its id, so by the time the
    /// task runs the interaction is usually dropped already and the task
    /// does nothing. It clears the scroll-ancestor list only when something
    /// still holds the interaction.
    fn reschedule_cleanup(&self, interaction: &Rc<Interaction<H::Element>>) {
        if let Some(handle) = interaction.cleanup.take() {
            scheduler::cancel_idle(&self.host, handle);
        }
        let retained = Rc::downgrade(interaction);
        let handle = scheduler::schedule_idle(&self.host, CLEANUP_IDLE_TIMEOUT_MS, move |_| {
            if let Some(interaction) = retained.upgrade() {
                interaction.scroll_parents.borrow_mut().clear();
                interaction.cleanup.set(None);
            }
        });
        interaction.cleanup.set(handle);
    }

    fn on_click(&self, event: &H::Event) -> ClickVerdict {
        let (destroyed, guard) = {
            let state = self.state.borrow();
            (state.destroyed, state.guard)
        };
        if destroyed || !self.config.click_guard {
            return ClickVerdict::Disabled;
        }
        let Some(guard) = guard else {
            return ClickVerdict::NoToken;
        };

        let point = facts::client_point(&self.host.read_event(event));
        let verdict = guard.check(self.host.now_ms(), point);
        if verdict == ClickVerdict::Suppressed {
            if let Err(err) = self.host.prevent_default(event) {
                trace!(error = %err, "preventDefault on click failed");
            }
            if let Err(err) = self.host.stop_propagation(event) {
                trace!(error = %err, "stopPropagation on click failed");
            }
        }
        trace!(?verdict, x = point.x, y = point.y, "click guard");
        verdict
    }

    fn destroy(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
        }
        self.cancel_active(CancelReason::Unmounted, None);
        self.state.borrow_mut().guard = None;
        debug!("press controller destroyed");
    }

    fn emit(&self, event: &HostGestureEvent<H>) {
        deliver(&*self.on_gesture, event);
    }

    fn gesture_from(
        &self,
        phase: GesturePhase,
        pointer: PointerKind,
        event: &H::Event,
        record: &EventRecord<H::Element>,
        reason: Option<CancelReason>,
    ) -> HostGestureEvent<H> {
        let point = facts::client_point(record);
        GestureEvent {
            phase,
            pointer,
            target: record.target.clone(),
            current_target: record.current_target.clone(),
            client_x: point.x,
            client_y: point.y,
            time_stamp: record.time_stamp.unwrap_or_else(|| self.host.now_ms()),
            modifiers: record.modifiers,
            button: record.button,
            original: Some(event.clone()),
            reason,
        }
    }

    /// Cancel raised without a native event (destroy, disable): reported at
    /// the interaction's start point.
    fn synthetic_cancel(
        &self,
        interaction: &Interaction<H::Element>,
        reason: CancelReason,
    ) -> HostGestureEvent<H> {
        GestureEvent {
            phase: GesturePhase::Cancel,
            pointer: interaction.pointer,
            target: interaction.target.clone(),
            current_target: interaction.current_target.clone(),
            client_x: interaction.origin.x,
            client_y: interaction.origin.y,
            time_stamp: self.host.now_ms(),
            modifiers: Modifiers::empty(),
            button: None,
            original: None,
            reason: Some(reason),
        }
    }
}

/// Invoke the consumer, discarding panics.
fn deliver<N, E>(callback: &dyn Fn(&GestureEvent<N, E>), event: &GestureEvent<N, E>) {
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| callback(event)));
    let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    match outcome {
        Ok(()) => trace!(phase = event.phase.as_str(), elapsed_us, "gesture delivered"),
        Err(_) => warn!(
            phase = event.phase.as_str(),
            elapsed_us, "gesture callback panicked; discarded"
        ),
    }
}
