//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding controller frames.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame text was not a well-formed envelope
    #[error("Malformed frame: {0}")]
    Decode(#[from] serde_json::Error),
}
