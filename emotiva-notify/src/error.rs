//! Error types for the notification multiplexer

use thiserror::Error;

/// Errors that can occur while starting the multiplexer or registering a
/// device with it.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Socket or poll setup failure
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
