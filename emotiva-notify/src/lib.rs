//! Notification multiplexer for Emotiva receivers
//!
//! Receivers push unsolicited status datagrams to a subscriber-chosen UDP
//! port that may be shared across devices. This crate owns those shared
//! listening sockets, polls them for readiness on a background thread, and
//! routes each datagram to the handler registered for its source address.
//!
//! ```no_run
//! use std::sync::Arc;
//! use emotiva_notify::Notifier;
//!
//! let notifier = Notifier::start().unwrap();
//! let ip = "192.168.1.40".parse().unwrap();
//! notifier.register(ip, 7003, Arc::new(|data| {
//!     println!("got {} bytes", data.len());
//! })).unwrap();
//! assert!(notifier.is_registered(ip));
//! // ... later
//! notifier.shutdown();
//! ```
//!
//! Registration state can be inspected with [`Notifier::is_registered`];
//! re-registering a known address is a deliberate no-op (first
//! registration wins), so that query is the only signal a caller gets.

mod error;
mod multiplexer;

pub use error::NotifyError;
pub use multiplexer::{Notifier, NotifyCallback};
