//! Error types for device sessions

use emotiva_notify::NotifyError;
use emotiva_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur constructing or driving a device session.
///
/// Read timeouts are not represented here: a control exchange that sees no
/// further reply within the timeout window has simply finished.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Transponder advertisement is missing the control or notify port
    #[error("invalid advertisement: {0}")]
    InvalidAdvertisement(String),

    /// Operation requires `connect` to have been called first
    #[error("control channel not connected")]
    NotConnected,

    /// A reply failed to decode
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Multiplexer registration failure
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Control socket failure
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
