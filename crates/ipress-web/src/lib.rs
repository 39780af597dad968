#![forbid(unsafe_code)]

//! Browser side of IntentPress.
//!
//! - [`options`]: JS option objects (as JSON) to [`ipress_core::PressConfig`].
//!   Platform independent and tested natively.
//! - `WebHost`: [`ipress_core::Host`] over `web-sys`. `wasm32` only.
//! - `IntentPress`: the element binding exported to JS. `wasm32` only.
//!
//! Everything that needs a browser compiles only for `wasm32`; on other
//! targets this crate is just the options parser.

pub mod options;

#[cfg(target_arch = "wasm32")]
mod binding;
#[cfg(target_arch = "wasm32")]
mod host;

#[cfg(target_arch = "wasm32")]
pub use binding::IntentPress;
#[cfg(target_arch = "wasm32")]
pub use host::WebHost;

pub use options::{options_from_value, parse_options};
