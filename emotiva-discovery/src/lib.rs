//! Emotiva receiver discovery
//!
//! Finds receivers on the local network by broadcasting an `emotivaPing`
//! and collecting the transponder replies that arrive within a rolling
//! inactivity window.
//!
//! ```no_run
//! let devices = emotiva_discovery::discover().unwrap();
//! for device in &devices {
//!     println!("receiver at {}", device.ip);
//! }
//! ```

mod broadcast;
mod error;

pub use error::{DiscoveryError, Result};

use std::net::IpAddr;
use std::time::Duration;

use emotiva_protocol::Element;

use broadcast::BroadcastClient;

/// UDP port the discovery ping is broadcast to.
pub const DISCOVER_REQUEST_PORT: u16 = 7000;

/// UDP port receivers send their transponder replies to.
pub const DISCOVER_RESPONSE_PORT: u16 = 7001;

/// Default inactivity window for a discovery round.
pub const DEFAULT_RESPONSE_WAIT: Duration = Duration::from_millis(500);

/// A receiver that answered the discovery broadcast.
///
/// The advertisement is the raw transponder document; parse it into a
/// session descriptor with `emotiva_sdk::Device::from_advertisement`.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Source address the reply arrived from
    pub ip: IpAddr,
    /// Decoded transponder advertisement
    pub advertisement: Element,
}

/// Discover receivers with the default half-second inactivity window.
pub fn discover() -> Result<Vec<DiscoveredDevice>> {
    discover_with_wait(DEFAULT_RESPONSE_WAIT)
}

/// Discover receivers, waiting `response_wait` after the last reply before
/// giving up.
///
/// Returns replies in arrival order. Zero responding devices is a normal
/// outcome, not an error. Replies that fail to decode are skipped.
pub fn discover_with_wait(response_wait: Duration) -> Result<Vec<DiscoveredDevice>> {
    let client = BroadcastClient::new(response_wait)?;
    let devices = client.ping()?.collect::<Result<Vec<_>>>()?;
    tracing::debug!("discovery round found {} device(s)", devices.len());
    Ok(devices)
}
