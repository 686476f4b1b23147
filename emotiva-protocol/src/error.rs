//! Error types for the wire codec

use thiserror::Error;

/// Errors that can occur while decoding device payloads
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload did not parse as a protocol XML document
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
