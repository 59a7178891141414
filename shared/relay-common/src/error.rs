//! Envelope Errors

use thiserror::Error;

/// Errors raised while encoding or decoding a channel envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Payload is not a valid envelope document.
    #[error("Malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Envelope carries an event name this relay does not handle.
    #[error("Unexpected event name: {0}")]
    UnexpectedName(String),
}
