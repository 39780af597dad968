//! Error types for host calls and configuration.

use thiserror::Error;

/// Failure reported by a [`Host`](crate::host::Host) call.
///
/// The controller treats every host failure on a best-effort path as
/// non-fatal: it logs and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The platform does not offer this capability.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// The platform offered the capability but refused the call.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Invalid press configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Slop override must be finite and non-negative.
    #[error("invalid slop override {0}: must be finite and >= 0")]
    InvalidSlop(f64),
    /// Options payload could not be decoded.
    #[error("malformed options: {0}")]
    Malformed(String),
}
