//! Gesture event model delivered to the consumer callback.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pointer classification for an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
    #[default]
    Unknown,
}

impl PointerKind {
    /// Parse a DOM `pointerType` string. Anything unrecognized is `Unknown`.
    #[must_use]
    pub fn from_dom(value: &str) -> Self {
        match value {
            "mouse" => Self::Mouse,
            "touch" => Self::Touch,
            "pen" => Self::Pen,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mouse => "mouse",
            Self::Touch => "touch",
            Self::Pen => "pen",
            Self::Unknown => "unknown",
        }
    }
}

/// Why an interaction (or a would-be interaction) was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CancelReason {
    Disabled,
    NonPrimary,
    Modified,
    Moved,
    Scrolled,
    Selection,
    Canceled,
    LostCapture,
    HitTest,
    Unmounted,
    Timeout,
    SupersededByNewInteraction,
}

impl CancelReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Disabled,
        Self::NonPrimary,
        Self::Modified,
        Self::Moved,
        Self::Scrolled,
        Self::Selection,
        Self::Canceled,
        Self::LostCapture,
        Self::HitTest,
        Self::Unmounted,
        Self::Timeout,
        Self::SupersededByNewInteraction,
    ];

    /// Stable wire name, as exposed to JS consumers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NonPrimary => "non-primary",
            Self::Modified => "modified",
            Self::Moved => "moved",
            Self::Scrolled => "scrolled",
            Self::Selection => "selection",
            Self::Canceled => "canceled",
            Self::LostCapture => "lost-capture",
            Self::HitTest => "hit-test",
            Self::Unmounted => "unmounted",
            Self::Timeout => "timeout",
            Self::SupersededByNewInteraction => "superseded-by-new-interaction",
        }
    }
}

impl core::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of a [`GestureEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GesturePhase {
    Start,
    Cancel,
    Intent,
}

impl GesturePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Cancel => "cancel",
            Self::Intent => "intent",
        }
    }
}

bitflags! {
    /// Modifier keys held during an event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const META  = 0b1000;
    }
}

/// Client-space point in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance; radius checks compare against `r * r`.
    #[must_use]
    pub fn distance_sq(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Immutable value handed to the consumer for every phase transition.
///
/// `N` is the host's element type, `E` its native event type. Cancel events
/// raised by `destroy` or `set_enabled` have no `original` event.
#[derive(Debug, Clone)]
pub struct GestureEvent<N, E> {
    pub phase: GesturePhase,
    pub pointer: PointerKind,
    pub target: Option<N>,
    pub current_target: Option<N>,
    pub client_x: f64,
    pub client_y: f64,
    pub time_stamp: f64,
    pub modifiers: Modifiers,
    pub button: Option<i16>,
    pub original: Option<E>,
    pub reason: Option<CancelReason>,
}

impl<N, E> GestureEvent<N, E> {
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.client_x, self.client_y)
    }

    #[must_use]
    pub fn alt_key(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub fn ctrl_key(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub fn meta_key(&self) -> bool {
        self.modifiers.contains(Modifiers::META)
    }

    #[must_use]
    pub fn shift_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_kind_from_dom_strings() {
        assert_eq!(PointerKind::from_dom("mouse"), PointerKind::Mouse);
        assert_eq!(PointerKind::from_dom("touch"), PointerKind::Touch);
        assert_eq!(PointerKind::from_dom("pen"), PointerKind::Pen);
        assert_eq!(PointerKind::from_dom(""), PointerKind::Unknown);
        assert_eq!(PointerKind::from_dom("Mouse"), PointerKind::Unknown);
    }

    #[test]
    fn cancel_reason_names_are_unique() {
        let mut names: Vec<_> = CancelReason::ALL.iter().map(|r| r.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CancelReason::ALL.len());
        assert_eq!(
            CancelReason::SupersededByNewInteraction.to_string(),
            "superseded-by-new-interaction"
        );
    }

    #[test]
    fn distance_sq_matches_pythagoras() {
        let a = Point::new(100.0, 100.0);
        assert_eq!(a.distance_sq(Point::new(104.0, 103.0)), 25.0);
        assert_eq!(a.distance_sq(Point::new(140.0, 100.0)), 1600.0);
        assert_eq!(a.distance_sq(a), 0.0);
    }

    #[test]
    fn modifier_accessors() {
        let ev: GestureEvent<(), ()> = GestureEvent {
            phase: GesturePhase::Start,
            pointer: PointerKind::Mouse,
            target: None,
            current_target: None,
            client_x: 1.0,
            client_y: 2.0,
            time_stamp: 0.0,
            modifiers: Modifiers::ALT | Modifiers::META,
            button: Some(0),
            original: None,
            reason: None,
        };
        assert!(ev.alt_key());
        assert!(ev.meta_key());
        assert!(!ev.ctrl_key());
        assert!(!ev.shift_key());
        assert_eq!(ev.point(), Point::new(1.0, 2.0));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn cancel_reason_serde_uses_wire_names() {
        for reason in CancelReason::ALL {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }
}
