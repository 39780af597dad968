//! Host capability traits: the boundary between the controller and the
//! platform it runs on.
//!
//! This mirrors a backend boundary: the controller never touches a DOM,
//! clock, or task queue directly. Concrete implementations:
//! - `ipress-web`: `web-sys` over the browser window and document.
//! - `ipress-harness`: a deterministic in-memory simulator.
//!
//! A platform without a window/document has no host at all; callers build
//! [`PressController::inert`](crate::PressController::inert) instead.

use core::fmt;

use crate::cancel::CancelScope;
use crate::error::HostError;
use crate::event::Modifiers;

/// Wall-clock-ish millisecond clock.
///
/// Browsers back this with `performance.now()`, the clock behind
/// `Event.timeStamp`; tests advance it by hand.
pub trait HostClock {
    fn now_ms(&self) -> f64;
}

/// Computed `overflow` value for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Auto,
    Scroll,
}

impl Overflow {
    /// Parse a computed-style keyword. Unknown keywords behave like `visible`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "hidden" => Self::Hidden,
            "clip" => Self::Clip,
            "auto" => Self::Auto,
            "scroll" => Self::Scroll,
            _ => Self::Visible,
        }
    }

    /// `auto` and `scroll` let content scroll.
    #[must_use]
    pub const fn allows_scroll(self) -> bool {
        matches!(self, Self::Auto | Self::Scroll)
    }
}

/// Computed overflow for both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverflowStyle {
    pub x: Overflow,
    pub y: Overflow,
}

/// Scrollable extent versus visible extent of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_width: i32,
    pub scroll_height: i32,
    pub client_width: i32,
    pub client_height: i32,
}

/// Snapshot of the document text selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub range_count: u32,
    pub is_collapsed: bool,
    pub anchor_offset: u32,
    pub focus_offset: u32,
    /// Length of the selected text, in UTF-16 code units on the web.
    pub text_len: usize,
}

/// Read-only document queries.
pub trait HostDom {
    /// Element handle. Equality must mean "same node".
    type Element: Clone + PartialEq + fmt::Debug + 'static;

    /// Tag name, in any case.
    fn tag_name(&self, element: &Self::Element) -> String;
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn parent_element(&self, element: &Self::Element) -> Option<Self::Element>;
    /// The root (`<html>`) element.
    fn document_element(&self) -> Option<Self::Element>;
    /// The document's designated scrolling element.
    fn scrolling_element(&self) -> Option<Self::Element>;
    /// Computed overflow, or `None` when computed style is unavailable.
    fn overflow(&self, element: &Self::Element) -> Option<OverflowStyle>;
    fn scroll_metrics(&self, element: &Self::Element) -> ScrollMetrics;
    /// Topmost element at a client point.
    ///
    /// Returns `Err(HostError::Unsupported)` when the platform cannot hit-test
    /// points at all, which is different from `Ok(None)` (nothing there).
    fn element_from_point(&self, x: f64, y: f64) -> Result<Option<Self::Element>, HostError>;
    /// Whether `node` is `root` or one of its descendants.
    fn contains(&self, root: &Self::Element, node: &Self::Element) -> bool;
    /// Raw device pixel ratio; sanitized by [`facts::device_pixel_ratio`](crate::facts::device_pixel_ratio).
    fn device_pixel_ratio(&self) -> Option<f64>;
    /// Current selection, or `None` when no selection API exists.
    fn selection(&self) -> Option<SelectionState>;
}

/// Deadline handed to idle callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleDeadline {
    pub did_timeout: bool,
    pub time_remaining_ms: f64,
}

/// One-shot deferred task.
pub type Task = Box<dyn FnOnce()>;

/// One-shot idle task.
pub type IdleTask = Box<dyn FnOnce(IdleDeadline)>;

/// Primitive task queues. The fallback policy lives in
/// [`scheduler`](crate::scheduler), not here.
pub trait HostTasks {
    /// Whether a native idle-callback facility exists.
    fn has_idle_callback(&self) -> bool;
    fn request_idle_callback(&self, timeout_ms: u32, task: IdleTask) -> Result<u32, HostError>;
    fn cancel_idle_callback(&self, handle: u32);
    fn set_timeout(&self, delay_ms: u32, task: Task) -> Result<u32, HostError>;
    fn clear_timeout(&self, handle: u32);
    /// Whether a native microtask queue exists.
    fn has_microtask_queue(&self) -> bool;
    fn queue_microtask(&self, task: Task) -> Result<(), HostError>;
    /// Run `task` as a continuation of an already-resolved promise.
    fn resolve_then(&self, task: Task) -> Result<(), HostError>;
}

/// Where a listener is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenTarget<N> {
    Window,
    Element(N),
}

/// Abstract event families the controller listens for while an interaction
/// is live. Hosts map these onto native event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenKind {
    Move,
    Up,
    Cancel,
    LostCapture,
    Resize,
    Scroll,
}

impl ListenKind {
    /// Scroll events do not bubble, so they are observed in the capture phase.
    #[must_use]
    pub const fn capture(self) -> bool {
        matches!(self, Self::Scroll)
    }
}

/// Listener callback.
pub type Listener<E> = Box<dyn Fn(&E)>;

/// Raw shape of a native pointer, mouse, or touch event.
///
/// Every field is optional because the event families disagree about which
/// ones exist; [`facts`](crate::facts) turns this into semantic facts.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord<N> {
    /// DOM `pointerType`, present on pointer events only.
    pub pointer_type: Option<String>,
    pub pointer_id: Option<i32>,
    /// `clientX`/`clientY`, present only when both are numbers.
    pub client: Option<(f64, f64)>,
    /// `touches` list, `None` when the field does not exist.
    pub touches: Option<Vec<(f64, f64)>>,
    /// `changedTouches` list, `None` when the field does not exist.
    pub changed_touches: Option<Vec<(f64, f64)>>,
    pub button: Option<i16>,
    pub modifiers: Modifiers,
    pub time_stamp: Option<f64>,
    pub target: Option<N>,
    pub current_target: Option<N>,
}

impl<N> Default for EventRecord<N> {
    fn default() -> Self {
        Self {
            pointer_type: None,
            pointer_id: None,
            client: None,
            touches: None,
            changed_touches: None,
            button: None,
            modifiers: Modifiers::empty(),
            time_stamp: None,
            target: None,
            current_target: None,
        }
    }
}

/// Unified host combining clock, document queries, task queues, and event
/// plumbing.
///
/// Handles are expected to be cheap to clone; the controller keeps one and
/// hands clones to deferred work.
pub trait Host: HostClock + HostDom + HostTasks + Clone + 'static {
    /// Native event handle.
    type Event: Clone + fmt::Debug + 'static;

    fn read_event(&self, event: &Self::Event) -> EventRecord<Self::Element>;
    fn prevent_default(&self, event: &Self::Event) -> Result<(), HostError>;
    fn stop_propagation(&self, event: &Self::Event) -> Result<(), HostError>;
    /// Request pointer capture; `Unsupported` when the element cannot capture.
    fn set_pointer_capture(&self, element: &Self::Element, pointer_id: i32)
    -> Result<(), HostError>;

    /// Attach `listener` until `scope` is cancelled.
    ///
    /// Implementations must register the detach on `scope` and must not
    /// attach anything when `scope` is already cancelled.
    fn listen(
        &self,
        target: ListenTarget<Self::Element>,
        kind: ListenKind,
        scope: &CancelScope,
        listener: Listener<Self::Event>,
    ) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_keywords() {
        assert_eq!(Overflow::parse("auto"), Overflow::Auto);
        assert_eq!(Overflow::parse(" scroll "), Overflow::Scroll);
        assert_eq!(Overflow::parse("hidden"), Overflow::Hidden);
        assert_eq!(Overflow::parse("inherit"), Overflow::Visible);
        assert!(Overflow::Auto.allows_scroll());
        assert!(Overflow::Scroll.allows_scroll());
        assert!(!Overflow::Hidden.allows_scroll());
        assert!(!Overflow::Clip.allows_scroll());
    }

    #[test]
    fn only_scroll_listens_in_capture_phase() {
        assert!(ListenKind::Scroll.capture());
        for kind in [
            ListenKind::Move,
            ListenKind::Up,
            ListenKind::Cancel,
            ListenKind::LostCapture,
            ListenKind::Resize,
        ] {
            assert!(!kind.capture());
        }
    }

    #[test]
    fn default_record_is_empty() {
        let record: EventRecord<u32> = EventRecord::default();
        assert!(record.pointer_type.is_none());
        assert!(record.client.is_none());
        assert!(record.modifiers.is_empty());
    }
}
