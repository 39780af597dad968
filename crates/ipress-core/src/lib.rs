#![forbid(unsafe_code)]

//! Core: press-intent disambiguation for pointing surfaces.
//!
//! # Role in IntentPress
//! `ipress-core` decides whether a pointer contact was a deliberate press or
//! something else (a drag, a scroll, a text selection, a modified or
//! secondary-button click). It is host-agnostic: every platform query goes
//! through the [`host::Host`] capability, so the same controller runs against
//! the browser (`ipress-web`) and the deterministic simulator
//! (`ipress-harness`).
//!
//! # Primary responsibilities
//! - **PressController**: the per-interaction state machine, guard policies,
//!   and post-commit click suppression.
//! - **Facts**: pure normalization of raw pointer/mouse/touch event shapes.
//! - **Scheduler**: idle and microtask deferral with fallbacks.
//! - **CancelScope**: one signal that detaches every listener of an
//!   interaction at once.

pub mod cancel;
pub mod click_guard;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod facts;
pub mod host;
pub mod logging;
pub mod scheduler;

pub use cancel::CancelScope;
pub use click_guard::{CLICK_GUARD_RADIUS_PX, CLICK_GUARD_WINDOW_MS, ClickVerdict, GuardToken};
pub use config::PressConfig;
pub use controller::{GestureCallback, HostGestureEvent, PressController};
pub use error::{ConfigError, HostError};
pub use event::{CancelReason, GestureEvent, GesturePhase, Modifiers, Point, PointerKind};
pub use host::{EventRecord, Host, HostClock, HostDom, HostTasks, ListenKind, ListenTarget};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
