//! Error types for the phonedeck client.

use thiserror::Error;

/// Errors surfaced by client operations.
///
/// The variants keep the three failure classes distinct at the API
/// boundary: bad input rejected before any network activity, transport
/// failure, and a well-formed response that carries an application error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Missing or invalid input, rejected pre-flight.
    #[error("validation error: {0}")]
    Validation(String),

    /// One-shot request network failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered but its payload reports an error.
    #[error("server error: {0}")]
    Application(String),

    /// The run stream is definitively closed without completing.
    #[error("stream closed: {0}")]
    StreamClosed(String),

    /// Response body did not decode into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Returns true for failures reported by the server application
    /// rather than by the transport.
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application(_))
    }
}
