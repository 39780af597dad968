//! Controller configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::event::PointerKind;

/// Upper bound on the DPR scale applied to the default slop.
const MAX_SLOP_SCALE: f64 = 1.5;

/// Options fixed for the lifetime of one controller.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct PressConfig {
    /// Movement tolerance in CSS pixels; `None` derives it from pointer kind
    /// and device pixel ratio.
    pub slop: Option<f64>,
    /// Longest accepted hold in milliseconds (`0` = unlimited).
    pub max_press_ms: u32,
    /// Accept presses with alt/ctrl/meta/shift held.
    pub allow_modified: bool,
    /// Ignore text-selection changes between down and up.
    pub allow_text_selection: bool,
    /// Accept non-primary buttons.
    pub allow_non_primary: bool,
    /// Call `preventDefault` on down for non-interactive elements.
    pub prevent_default: bool,
    /// Suppress the native click that follows a committed press.
    pub click_guard: bool,
    /// Initial enabled state.
    pub enabled: bool,
}

impl Default for PressConfig {
    fn default() -> Self {
        Self {
            slop: None,
            max_press_ms: 0,
            allow_modified: false,
            allow_text_selection: false,
            allow_non_primary: false,
            prevent_default: false,
            click_guard: true,
            enabled: true,
        }
    }
}

impl PressConfig {
    /// Reject a slop override that is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.slop {
            Some(slop) if !slop.is_finite() || slop < 0.0 => Err(ConfigError::InvalidSlop(slop)),
            _ => Ok(()),
        }
    }

    /// Slop for one interaction: the valid override, else [`default_slop`].
    #[must_use]
    pub fn slop_for(&self, pointer: PointerKind, dpr: f64) -> f64 {
        match self.slop {
            Some(slop) if slop.is_finite() && slop >= 0.0 => slop,
            _ => default_slop(pointer, dpr),
        }
    }
}

/// Base tolerance per pointer kind, scaled by `min(1.5, max(1, dpr / 2))`.
#[must_use]
pub fn default_slop(pointer: PointerKind, dpr: f64) -> f64 {
    let base = match pointer {
        PointerKind::Touch => 12.0,
        PointerKind::Pen => 8.0,
        PointerKind::Mouse | PointerKind::Unknown => 4.0,
    };
    let scale = (dpr / 2.0).max(1.0).min(MAX_SLOP_SCALE);
    base * scale
}
