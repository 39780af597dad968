#![forbid(unsafe_code)]

//! Deterministic in-memory host.
//!
//! [`SimHost`] stands in for a browser window and document:
//! - **Element tree** with tags, attributes, rectangles, overflow, and scroll
//!   extents; `element_from_point` returns the last-appended element whose
//!   rectangle contains the point.
//! - **Manual clock**: time only moves through [`SimHost::advance`] or
//!   [`SimHost::set_now`].
//! - **Task queues**: microtasks run only on [`SimHost::drain_microtasks`];
//!   timers and idle callbacks run when the clock passes their due time or on
//!   [`SimHost::run_idle`].
//! - **Listener registry** that honours [`CancelScope`]: a cancelled scope
//!   detaches its listeners before the next dispatch step.
//!
//! Every platform capability can be switched off through
//! [`SimCapabilities`] to exercise fallback paths.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use ipress_core::event::{Modifiers, Point, PointerKind};
use ipress_core::host::{
    EventRecord, Host, HostClock, HostDom, HostTasks, IdleDeadline, IdleTask, ListenKind,
    ListenTarget, Listener, Overflow, OverflowStyle, ScrollMetrics, SelectionState, Task,
};
use ipress_core::{CancelScope, HostError};

/// Viewport used for the root and body rectangles.
pub const VIEWPORT: Rect = Rect::new(0.0, 0.0, 1024.0, 768.0);

/// Handle to a simulated element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimElement(usize);

impl SimElement {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Axis-aligned client rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open on the far edges, like layout boxes.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }
}

/// Platform features the simulator pretends to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimCapabilities {
    pub idle_callback: bool,
    pub microtask_queue: bool,
    pub promise: bool,
    pub timers: bool,
    pub element_from_point: bool,
    pub pointer_capture: bool,
    pub selection_api: bool,
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

impl Default for SimCapabilities {
    fn default() -> Self {
        Self {
            idle_callback: true,
            microtask_queue: true,
            promise: true,
            timers: true,
            element_from_point: true,
            pointer_capture: true,
            selection_api: true,
            prevent_default: true,
            stop_propagation: true,
        }
    }
}

#[derive(Debug, Default)]
struct SimEventFlags {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

/// Simulated native event. Clones share their prevented/stopped flags.
#[derive(Debug, Clone)]
pub struct SimEvent {
    record: EventRecord<SimElement>,
    flags: Rc<SimEventFlags>,
}

impl SimEvent {
    /// An event with no fields at all.
    #[must_use]
    pub fn bare() -> Self {
        Self {
            record: EventRecord::default(),
            flags: Rc::default(),
        }
    }

    /// Pointer event with an explicit `pointerType`, primary button, id 1.
    #[must_use]
    pub fn pointer(kind: PointerKind, x: f64, y: f64) -> Self {
        let mut event = Self::bare();
        event.record.pointer_type = Some(kind.as_str().to_owned());
        event.record.pointer_id = Some(1);
        event.record.client = Some((x, y));
        event.record.button = Some(0);
        event
    }

    /// Legacy mouse event: no `pointerType`, button field present.
    #[must_use]
    pub fn mouse(x: f64, y: f64) -> Self {
        let mut event = Self::bare();
        event.record.client = Some((x, y));
        event.record.button = Some(0);
        event
    }

    /// Legacy touch event: coordinates only inside the touch lists.
    #[must_use]
    pub fn touch(x: f64, y: f64) -> Self {
        let mut event = Self::bare();
        event.record.touches = Some(vec![(x, y)]);
        event.record.changed_touches = Some(vec![(x, y)]);
        event
    }

    #[must_use]
    pub fn with_button(mut self, button: i16) -> Self {
        self.record.button = Some(button);
        self
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.record.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_pointer_id(mut self, pointer_id: Option<i32>) -> Self {
        self.record.pointer_id = pointer_id;
        self
    }

    #[must_use]
    pub fn with_time_stamp(mut self, time_stamp: f64) -> Self {
        self.record.time_stamp = Some(time_stamp);
        self
    }

    /// Set both the raw target and the bound (current) target.
    #[must_use]
    pub fn on(mut self, element: SimElement) -> Self {
        self.record.target = Some(element);
        self.record.current_target = Some(element);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Option<SimElement>) -> Self {
        self.record.target = target;
        self
    }

    #[must_use]
    pub fn with_current_target(mut self, current_target: Option<SimElement>) -> Self {
        self.record.current_target = current_target;
        self
    }

    #[must_use]
    pub fn record(&self) -> &EventRecord<SimElement> {
        &self.record
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.get()
    }

    #[must_use]
    pub fn propagation_stopped(&self) -> bool {
        self.flags.propagation_stopped.get()
    }
}

#[derive(Debug, Clone)]
struct SimNode {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<SimElement>,
    rect: Option<Rect>,
    overflow: OverflowStyle,
    metrics: ScrollMetrics,
}

impl SimNode {
    fn new(tag: &str, parent: Option<SimElement>) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            attributes: Vec::new(),
            parent,
            rect: None,
            overflow: OverflowStyle::default(),
            metrics: ScrollMetrics::default(),
        }
    }
}

struct SimListener {
    target: ListenTarget<SimElement>,
    kind: ListenKind,
    live: Cell<bool>,
    callback: Listener<SimEvent>,
}

struct SimTimer {
    id: u32,
    due: f64,
    task: Task,
}

struct SimIdle {
    id: u32,
    due: f64,
    task: IdleTask,
}

enum DueWork {
    Timer(Task),
    Idle(IdleTask),
}

struct SimInner {
    now: Cell<f64>,
    dpr: Cell<Option<f64>>,
    caps: Cell<SimCapabilities>,
    nodes: RefCell<Vec<SimNode>>,
    scrolling_element: Cell<Option<SimElement>>,
    selection: Cell<Option<SelectionState>>,
    listeners: RefCell<Vec<Rc<SimListener>>>,
    microtasks: RefCell<VecDeque<Task>>,
    timers: RefCell<Vec<SimTimer>>,
    idle: RefCell<Vec<SimIdle>>,
    next_handle: Cell<u32>,
    captures: RefCell<Vec<(SimElement, i32)>>,
}

/// Cloneable handle to one simulated window + document.
#[derive(Clone)]
pub struct SimHost {
    inner: Rc<SimInner>,
}

impl core::fmt::Debug for SimHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimHost")
            .field("now", &self.now())
            .field("nodes", &self.inner.nodes.borrow().len())
            .field("live_listeners", &self.live_listener_count())
            .field("pending_microtasks", &self.pending_microtasks())
            .finish()
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    /// `<html>` containing `<body>`, both covering [`VIEWPORT`]; `<html>` is
    /// the scrolling element.
    #[must_use]
    pub fn new() -> Self {
        let html = {
            let mut node = SimNode::new("html", None);
            node.rect = Some(VIEWPORT);
            node
        };
        let body = {
            let mut node = SimNode::new("body", Some(SimElement(0)));
            node.rect = Some(VIEWPORT);
            node
        };
        Self {
            inner: Rc::new(SimInner {
                now: Cell::new(0.0),
                dpr: Cell::new(Some(1.0)),
                caps: Cell::new(SimCapabilities::default()),
                nodes: RefCell::new(vec![html, body]),
                scrolling_element: Cell::new(Some(SimElement(0))),
                selection: Cell::new(Some(SelectionState::default())),
                listeners: RefCell::new(Vec::new()),
                microtasks: RefCell::new(VecDeque::new()),
                timers: RefCell::new(Vec::new()),
                idle: RefCell::new(Vec::new()),
                next_handle: Cell::new(0),
                captures: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn with_capabilities(caps: SimCapabilities) -> Self {
        let host = Self::new();
        host.set_capabilities(caps);
        host
    }

    // --- document ---------------------------------------------------------

    #[must_use]
    pub const fn html(&self) -> SimElement {
        SimElement(0)
    }

    #[must_use]
    pub const fn body(&self) -> SimElement {
        SimElement(1)
    }

    /// Append a child element. Later elements paint above earlier ones.
    pub fn append(&self, parent: SimElement, tag: &str) -> SimElement {
        let mut nodes = self.inner.nodes.borrow_mut();
        nodes.push(SimNode::new(tag, Some(parent)));
        SimElement(nodes.len() - 1)
    }

    pub fn set_rect(&self, element: SimElement, rect: Option<Rect>) {
        self.inner.nodes.borrow_mut()[element.0].rect = rect;
    }

    pub fn set_attribute(&self, element: SimElement, name: &str, value: &str) {
        let mut nodes = self.inner.nodes.borrow_mut();
        let attributes = &mut nodes[element.0].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => attributes.push((name.to_owned(), value.to_owned())),
        }
    }

    pub fn set_overflow(&self, element: SimElement, overflow: OverflowStyle) {
        self.inner.nodes.borrow_mut()[element.0].overflow = overflow;
    }

    pub fn set_scroll_metrics(&self, element: SimElement, metrics: ScrollMetrics) {
        self.inner.nodes.borrow_mut()[element.0].metrics = metrics;
    }

    /// Vertical `overflow: auto` with content taller than the box.
    pub fn make_scrollable(&self, element: SimElement) {
        self.set_overflow(
            element,
            OverflowStyle {
                x: Overflow::Hidden,
                y: Overflow::Auto,
            },
        );
        self.set_scroll_metrics(
            element,
            ScrollMetrics {
                scroll_width: 100,
                scroll_height: 1_000,
                client_width: 100,
                client_height: 100,
            },
        );
    }

    pub fn set_scrolling_element(&self, element: Option<SimElement>) {
        self.inner.scrolling_element.set(element);
    }

    pub fn set_device_pixel_ratio(&self, dpr: Option<f64>) {
        self.inner.dpr.set(dpr);
    }

    pub fn set_capabilities(&self, caps: SimCapabilities) {
        self.inner.caps.set(caps);
    }

    #[must_use]
    pub fn capabilities(&self) -> SimCapabilities {
        self.inner.caps.get()
    }

    // --- selection --------------------------------------------------------

    pub fn set_selection(&self, selection: Option<SelectionState>) {
        self.inner.selection.set(selection);
    }

    /// A non-collapsed range selection.
    pub fn select_text(&self, anchor_offset: u32, focus_offset: u32, text_len: usize) {
        self.set_selection(Some(SelectionState {
            range_count: 1,
            is_collapsed: false,
            anchor_offset,
            focus_offset,
            text_len,
        }));
    }

    /// A caret with no selected text.
    pub fn collapse_selection(&self) {
        self.set_selection(Some(SelectionState {
            range_count: 1,
            is_collapsed: true,
            anchor_offset: 0,
            focus_offset: 0,
            text_len: 0,
        }));
    }

    // --- pointer capture --------------------------------------------------

    #[must_use]
    pub fn captures(&self) -> Vec<(SimElement, i32)> {
        self.inner.captures.borrow().clone()
    }

    // --- clock and queues -------------------------------------------------

    #[must_use]
    pub fn now(&self) -> f64 {
        self.inner.now.get()
    }

    pub fn set_now(&self, now: f64) {
        self.inner.now.set(now);
    }

    /// Move the clock forward, running timers and timed-out idle callbacks
    /// in due order, each followed by a microtask checkpoint.
    pub fn advance(&self, ms: f64) {
        let until = self.now() + ms;
        while let Some((due, work)) = self.take_next_due(until) {
            self.inner.now.set(due.max(self.now()));
            match work {
                DueWork::Timer(task) => task(),
                DueWork::Idle(task) => task(IdleDeadline {
                    did_timeout: true,
                    time_remaining_ms: 0.0,
                }),
            }
            self.drain_microtasks();
        }
        self.inner.now.set(until);
    }

    fn take_next_due(&self, until: f64) -> Option<(f64, DueWork)> {
        let mut timers = self.inner.timers.borrow_mut();
        let mut idle = self.inner.idle.borrow_mut();
        let timer = timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by(|a, b| a.1.due.total_cmp(&b.1.due))
            .map(|(index, t)| (index, t.due));
        let idle_due = idle
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by(|a, b| a.1.due.total_cmp(&b.1.due))
            .map(|(index, t)| (index, t.due));
        match (timer, idle_due) {
            (Some((ti, td)), Some((_, id))) if td <= id => {
                Some((td, DueWork::Timer(timers.remove(ti).task)))
            }
            (_, Some((ii, id))) => Some((id, DueWork::Idle(idle.remove(ii).task))),
            (Some((ti, td)), None) => Some((td, DueWork::Timer(timers.remove(ti).task))),
            (None, None) => None,
        }
    }

    /// Run every pending idle callback as if the browser went idle now.
    pub fn run_idle(&self) -> usize {
        let pending = std::mem::take(&mut *self.inner.idle.borrow_mut());
        let count = pending.len();
        for idle in pending {
            (idle.task)(IdleDeadline {
                did_timeout: false,
                time_remaining_ms: 50.0,
            });
        }
        self.drain_microtasks();
        count
    }

    /// Run microtasks until the queue is empty, including ones queued while
    /// draining. Returns how many ran.
    pub fn drain_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.inner.microtasks.borrow_mut().pop_front();
            let Some(task) = next else {
                return ran;
            };
            task();
            ran += 1;
        }
    }

    #[must_use]
    pub fn pending_microtasks(&self) -> usize {
        self.inner.microtasks.borrow().len()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    #[must_use]
    pub fn pending_idle(&self) -> usize {
        self.inner.idle.borrow().len()
    }

    fn next_handle(&self) -> u32 {
        let id = self.inner.next_handle.get().wrapping_add(1);
        self.inner.next_handle.set(id);
        id
    }

    // --- listeners and dispatch -------------------------------------------

    #[must_use]
    pub fn live_listener_count(&self) -> usize {
        self.inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.live.get())
            .count()
    }

    /// Invoke every live listener registered for `target`/`kind`, in
    /// registration order. Listeners detached mid-dispatch are skipped.
    pub fn dispatch(&self, target: &ListenTarget<SimElement>, kind: ListenKind, event: &SimEvent) -> usize {
        let snapshot: Vec<Rc<SimListener>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|l| l.kind == kind && l.target == *target)
            .cloned()
            .collect();
        let mut invoked = 0;
        for listener in snapshot {
            if listener.live.get() {
                (listener.callback)(event);
                invoked += 1;
            }
        }
        invoked
    }

    pub fn pointer_move(&self, event: &SimEvent) -> usize {
        self.dispatch(&ListenTarget::Window, ListenKind::Move, event)
    }

    pub fn pointer_up(&self, event: &SimEvent) -> usize {
        self.dispatch(&ListenTarget::Window, ListenKind::Up, event)
    }

    pub fn pointer_cancel(&self, event: &SimEvent) -> usize {
        self.dispatch(&ListenTarget::Window, ListenKind::Cancel, event)
    }

    pub fn lost_capture(&self, event: &SimEvent) -> usize {
        self.dispatch(&ListenTarget::Window, ListenKind::LostCapture, event)
    }

    pub fn resize(&self) -> usize {
        self.dispatch(&ListenTarget::Window, ListenKind::Resize, &SimEvent::bare())
    }

    /// Scroll `element`: capture-phase listeners on the window, then on each
    /// ancestor from the root down to `element` itself.
    pub fn scroll(&self, element: SimElement) -> usize {
        let event = SimEvent::bare().with_target(Some(element));
        let mut path = vec![element];
        let mut current = self.parent_element(&element);
        while let Some(parent) = current {
            path.push(parent);
            current = self.parent_element(&parent);
        }
        let mut invoked = self.dispatch(&ListenTarget::Window, ListenKind::Scroll, &event);
        for node in path.into_iter().rev() {
            invoked += self.dispatch(&ListenTarget::Element(node), ListenKind::Scroll, &event);
        }
        invoked
    }
}

impl HostClock for SimHost {
    fn now_ms(&self) -> f64 {
        self.now()
    }
}

impl HostDom for SimHost {
    type Element = SimElement;

    fn tag_name(&self, element: &SimElement) -> String {
        self.inner.nodes.borrow()[element.0].tag.clone()
    }

    fn attribute(&self, element: &SimElement, name: &str) -> Option<String> {
        self.inner.nodes.borrow()[element.0]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    fn parent_element(&self, element: &SimElement) -> Option<SimElement> {
        self.inner.nodes.borrow()[element.0].parent
    }

    fn document_element(&self) -> Option<SimElement> {
        Some(self.html())
    }

    fn scrolling_element(&self) -> Option<SimElement> {
        self.inner.scrolling_element.get()
    }

    fn overflow(&self, element: &SimElement) -> Option<OverflowStyle> {
        Some(self.inner.nodes.borrow()[element.0].overflow)
    }

    fn scroll_metrics(&self, element: &SimElement) -> ScrollMetrics {
        self.inner.nodes.borrow()[element.0].metrics
    }

    fn element_from_point(&self, x: f64, y: f64) -> Result<Option<SimElement>, HostError> {
        if !self.capabilities().element_from_point {
            return Err(HostError::Unsupported("elementFromPoint"));
        }
        let point = Point::new(x, y);
        let nodes = self.inner.nodes.borrow();
        Ok(nodes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, node)| node.rect.is_some_and(|rect| rect.contains(point)))
            .map(|(index, _)| SimElement(index)))
    }

    fn contains(&self, root: &SimElement, node: &SimElement) -> bool {
        let mut current = Some(*node);
        while let Some(element) = current {
            if element == *root {
                return true;
            }
            current = self.parent_element(&element);
        }
        false
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        self.inner.dpr.get()
    }

    fn selection(&self) -> Option<SelectionState> {
        if !self.capabilities().selection_api {
            return None;
        }
        self.inner.selection.get()
    }
}

impl HostTasks for SimHost {
    fn has_idle_callback(&self) -> bool {
        self.capabilities().idle_callback
    }

    fn request_idle_callback(&self, timeout_ms: u32, task: IdleTask) -> Result<u32, HostError> {
        if !self.capabilities().idle_callback {
            return Err(HostError::Unsupported("requestIdleCallback"));
        }
        let id = self.next_handle();
        self.inner.idle.borrow_mut().push(SimIdle {
            id,
            due: self.now() + f64::from(timeout_ms),
            task,
        });
        Ok(id)
    }

    fn cancel_idle_callback(&self, handle: u32) {
        self.inner.idle.borrow_mut().retain(|idle| idle.id != handle);
    }

    fn set_timeout(&self, delay_ms: u32, task: Task) -> Result<u32, HostError> {
        if !self.capabilities().timers {
            return Err(HostError::Unsupported("setTimeout"));
        }
        let id = self.next_handle();
        self.inner.timers.borrow_mut().push(SimTimer {
            id,
            due: self.now() + f64::from(delay_ms),
            task,
        });
        Ok(id)
    }

    fn clear_timeout(&self, handle: u32) {
        self.inner.timers.borrow_mut().retain(|timer| timer.id != handle);
    }

    fn has_microtask_queue(&self) -> bool {
        self.capabilities().microtask_queue
    }

    fn queue_microtask(&self, task: Task) -> Result<(), HostError> {
        if !self.capabilities().microtask_queue {
            return Err(HostError::Unsupported("queueMicrotask"));
        }
        self.inner.microtasks.borrow_mut().push_back(task);
        Ok(())
    }

    fn resolve_then(&self, task: Task) -> Result<(), HostError> {
        if !self.capabilities().promise {
            return Err(HostError::Unsupported("Promise"));
        }
        self.inner.microtasks.borrow_mut().push_back(task);
        Ok(())
    }
}

impl Host for SimHost {
    type Event = SimEvent;

    fn read_event(&self, event: &SimEvent) -> EventRecord<SimElement> {
        event.record.clone()
    }

    fn prevent_default(&self, event: &SimEvent) -> Result<(), HostError> {
        if !self.capabilities().prevent_default {
            return Err(HostError::Rejected("preventDefault threw".to_owned()));
        }
        event.flags.default_prevented.set(true);
        Ok(())
    }

    fn stop_propagation(&self, event: &SimEvent) -> Result<(), HostError> {
        if !self.capabilities().stop_propagation {
            return Err(HostError::Rejected("stopPropagation threw".to_owned()));
        }
        event.flags.propagation_stopped.set(true);
        Ok(())
    }

    fn set_pointer_capture(&self, element: &SimElement, pointer_id: i32) -> Result<(), HostError> {
        if !self.capabilities().pointer_capture {
            return Err(HostError::Unsupported("setPointerCapture"));
        }
        self.inner.captures.borrow_mut().push((*element, pointer_id));
        Ok(())
    }

    fn listen(
        &self,
        target: ListenTarget<SimElement>,
        kind: ListenKind,
        scope: &CancelScope,
        listener: Listener<SimEvent>,
    ) -> Result<(), HostError> {
        if scope.is_cancelled() {
            return Ok(());
        }
        let entry = Rc::new(SimListener {
            target,
            kind,
            live: Cell::new(true),
            callback: listener,
        });
        self.inner.listeners.borrow_mut().push(Rc::clone(&entry));

        let registry: Weak<SimInner> = Rc::downgrade(&self.inner);
        scope.on_cancel(move || {
            entry.live.set(false);
            if let Some(inner) = registry.upgrade() {
                inner
                    .listeners
                    .borrow_mut()
                    .retain(|other| !Rc::ptr_eq(other, &entry));
            }
        });
        Ok(())
    }
}
