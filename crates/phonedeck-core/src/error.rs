//! Core domain errors.

use thiserror::Error;

/// Core domain errors for phonedeck.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Unknown device kind string.
    #[error("Unknown device kind: '{0}' (expected 'adb' or 'hdc')")]
    UnknownDeviceKind(String),
}
