//! Post-commit click suppression.
//!
//! Platforms fire a synthesized `click` after a press. When a press has
//! already committed as an intent, that click would trigger native click
//! handlers a second time. The controller records a [`GuardToken`] at commit
//! and swallows a click that lands close in both time and space.

use crate::event::Point;

/// Clicks later than this after a commit pass through.
pub const CLICK_GUARD_WINDOW_MS: f64 = 650.0;

/// Clicks farther than this from the commit point pass through.
pub const CLICK_GUARD_RADIUS_PX: f64 = 20.0;

/// Where and when the last press committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardToken {
    pub at_ms: f64,
    pub point: Point,
}

/// Outcome of one click-guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickVerdict {
    /// Default action and propagation were suppressed.
    Suppressed,
    /// No commit has been recorded.
    NoToken,
    /// The click came after the guard window.
    Expired,
    /// The click landed outside the guard radius.
    OutOfRadius,
    /// The guard is off, the controller is destroyed, or inert.
    Disabled,
}

impl GuardToken {
    #[must_use]
    pub const fn new(at_ms: f64, point: Point) -> Self {
        Self { at_ms, point }
    }

    /// Decide whether a click at `point`, `now_ms`, belongs to this commit.
    #[must_use]
    pub fn check(&self, now_ms: f64, point: Point) -> ClickVerdict {
        if now_ms - self.at_ms > CLICK_GUARD_WINDOW_MS {
            return ClickVerdict::Expired;
        }
        if self.point.distance_sq(point) <= CLICK_GUARD_RADIUS_PX * CLICK_GUARD_RADIUS_PX {
            ClickVerdict::Suppressed
        } else {
            ClickVerdict::OutOfRadius
        }
    }
}
