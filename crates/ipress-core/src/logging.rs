//! Logging shims.
//!
//! With the `tracing` feature the usual macros are re-exported from
//! [`tracing`]. Without it, macros of the same name expand to nothing so call
//! sites never need their own `cfg` guards.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

/// Install a JSON formatter as the global default subscriber.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`. Returns `false` when a
/// global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn install_json_subscriber() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
