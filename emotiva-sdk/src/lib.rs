//! Control-and-telemetry client for Emotiva network receivers
//!
//! Receivers speak an XML-framed UDP protocol: broadcast discovery, a
//! synchronous command/response control channel per device, and unsolicited
//! status notifications pushed to a shared notify port. This crate ties the
//! workspace together: discover devices, build a [`Device`] session from an
//! advertisement, and connect it to a shared [`Notifier`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use emotiva_sdk::{discover, Command, Device, Notifier};
//!
//! let notifier = Notifier::start().unwrap();
//! for found in discover().unwrap() {
//!     let mut device = Device::from_advertisement(found.ip, &found.advertisement).unwrap();
//!     device
//!         .connect(&notifier, Arc::new(|event| println!("{}: pushed update", event.name)))
//!         .unwrap();
//!     device
//!         .send_command(Command::new("volume").with_param("value", "1").with_param("ack", "yes"))
//!         .unwrap();
//! }
//! ```
//!
//! UDP semantics apply end to end: requests and replies may be lost or
//! reordered and the SDK does not compensate. Exchanges are bounded by
//! receive timeouts, and "nothing more arrived" is a normal outcome.

mod device;
mod error;
pub mod logging;

pub use device::{Device, EventSink, NOTIFY_EVENTS};
pub use error::DeviceError;

pub use emotiva_discovery::{
    discover, discover_with_wait, DiscoveredDevice, DiscoveryError, DEFAULT_RESPONSE_WAIT,
    DISCOVER_REQUEST_PORT, DISCOVER_RESPONSE_PORT,
};
pub use emotiva_notify::{Notifier, NotifyCallback, NotifyError};
pub use emotiva_protocol::{decode, encode, Command, Element, ProtocolError, XML_HEADER};
