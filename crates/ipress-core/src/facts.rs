//! Event facts: pure normalization of raw event shapes and document queries.
//!
//! Nothing here holds state. Functions over [`EventRecord`] are total; the
//! ones over [`HostDom`] degrade to the answer that avoids false
//! cancellations when the platform cannot tell.

use crate::event::{Point, PointerKind};
use crate::host::{EventRecord, HostDom};

/// Fingerprint of a collapsed (caret-only) selection.
pub const COLLAPSED_SELECTION: &str = "collapsed";

const INTERACTIVE_TAGS: [&str; 5] = ["a", "button", "input", "select", "textarea"];
const INTERACTIVE_ROLES: [&str; 4] = ["button", "link", "checkbox", "menuitem"];

/// Classify the pointer.
///
/// An explicit `pointerType` wins. Otherwise touch lists imply touch and a
/// button field implies mouse.
#[must_use]
pub fn pointer_kind<N>(record: &EventRecord<N>) -> PointerKind {
    if let Some(kind) = record.pointer_type.as_deref() {
        return PointerKind::from_dom(kind);
    }
    if record.touches.is_some() || record.changed_touches.is_some() {
        return PointerKind::Touch;
    }
    if record.button.is_some() {
        return PointerKind::Mouse;
    }
    PointerKind::Unknown
}

/// Client coordinates: direct fields, then the first changed touch, then the
/// first active touch, then the origin.
#[must_use]
pub fn client_point<N>(record: &EventRecord<N>) -> Point {
    if let Some((x, y)) = record.client {
        return Point::new(x, y);
    }
    let first = |list: &Option<Vec<(f64, f64)>>| list.as_ref().and_then(|l| l.first().copied());
    match first(&record.changed_touches).or_else(|| first(&record.touches)) {
        Some((x, y)) => Point::new(x, y),
        None => Point::ORIGIN,
    }
}

/// True unless an explicit non-zero button is present.
#[must_use]
pub fn is_primary_button<N>(record: &EventRecord<N>) -> bool {
    record.button.is_none_or(|button| button == 0)
}

/// True if any of alt/ctrl/meta/shift is held.
#[must_use]
pub fn has_modifiers<N>(record: &EventRecord<N>) -> bool {
    !record.modifiers.is_empty()
}

/// Whether an element already has native press semantics.
#[must_use]
pub fn is_probably_interactive<D: HostDom>(dom: &D, element: Option<&D::Element>) -> bool {
    let Some(element) = element else {
        return false;
    };
    let tag = dom.tag_name(element).to_ascii_lowercase();
    if INTERACTIVE_TAGS.contains(&tag.as_str()) {
        return true;
    }
    dom.attribute(element, "role")
        .is_some_and(|role| INTERACTIVE_ROLES.contains(&role.as_str()))
}

/// Cheap proxy for "did the selection meaningfully change".
///
/// Empty when there is no selection API or no range, [`COLLAPSED_SELECTION`]
/// for a caret, else `range:<anchor>:<focus>:<text length>`.
#[must_use]
pub fn selection_fingerprint<D: HostDom>(dom: &D) -> String {
    let Some(selection) = dom.selection() else {
        return String::new();
    };
    if selection.range_count == 0 {
        return String::new();
    }
    if selection.is_collapsed {
        return COLLAPSED_SELECTION.to_owned();
    }
    format!(
        "range:{}:{}:{}",
        selection.anchor_offset, selection.focus_offset, selection.text_len
    )
}

/// Scrollable means overflow `auto`/`scroll` on an axis whose content
/// exceeds its visible extent.
#[must_use]
pub fn is_scrollable<D: HostDom>(dom: &D, element: &D::Element) -> bool {
    let Some(style) = dom.overflow(element) else {
        return false;
    };
    let metrics = dom.scroll_metrics(element);
    let can_scroll_y = style.y.allows_scroll() && metrics.scroll_height > metrics.client_height;
    let can_scroll_x = style.x.allows_scroll() && metrics.scroll_width > metrics.client_width;
    can_scroll_x || can_scroll_y
}

/// Scrollable ancestors of `start` (inclusive), innermost first, stopping
/// before the root element, then the document scrolling element.
#[must_use]
pub fn scroll_parents<D: HostDom>(dom: &D, start: Option<&D::Element>) -> Vec<D::Element> {
    let root = dom.document_element();
    let mut parents = Vec::new();
    let mut current = start.cloned();
    while let Some(element) = current {
        if root.as_ref() == Some(&element) {
            break;
        }
        if is_scrollable(dom, &element) {
            parents.push(element.clone());
        }
        current = dom.parent_element(&element);
    }
    if let Some(scrolling) = dom.scrolling_element() {
        parents.push(scrolling);
    }
    parents
}

/// Whether the topmost element at `point` is `root` or inside it.
///
/// Without point hit-testing this answers `true`: a missed cancellation is
/// cheaper than a false one.
#[must_use]
pub fn contains_point<D: HostDom>(dom: &D, root: &D::Element, point: Point) -> bool {
    match dom.element_from_point(point.x, point.y) {
        Err(_) => true,
        Ok(None) => false,
        Ok(Some(hit)) => *root == hit || dom.contains(root, &hit),
    }
}

/// Device pixel ratio, sanitized to a positive finite number (default 1).
#[must_use]
pub fn device_pixel_ratio<D: HostDom>(dom: &D) -> f64 {
    match dom.device_pixel_ratio() {
        Some(dpr) if dpr.is_finite() && dpr > 0.0 => dpr,
        _ => 1.0,
    }
}
