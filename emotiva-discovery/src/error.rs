//! Error types for the discovery client

use thiserror::Error;

/// Errors that can occur during device discovery.
///
/// A read timing out is not one of them: the inactivity window elapsing is
/// how a discovery round normally ends.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Socket setup or send/receive failure
    #[error("network error: {0}")]
    Network(String),
}

/// Convenience Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
