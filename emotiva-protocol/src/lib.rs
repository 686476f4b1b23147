//! Wire codec for the Emotiva XML-over-UDP control protocol
//!
//! This crate frames outbound requests and parses inbound datagrams for the
//! higher-level discovery, control, and notification crates. It knows
//! nothing about sockets; callers hand it bytes.
//!
//! ```
//! use emotiva_protocol::{encode, decode, Command};
//!
//! let frame = encode(
//!     "emotivaControl",
//!     &[Command::new("volume").with_param("value", "1").with_param("ack", "yes")],
//! );
//! let tree = decode(&frame).unwrap();
//! assert_eq!(tree.name, "emotivaControl");
//! ```

mod codec;
mod error;

pub use codec::{decode, encode, Command, XML_HEADER};
pub use error::ProtocolError;

// Response trees are plain xmltree elements; re-export so downstream crates
// agree on the type without a direct dependency pin.
pub use xmltree::Element;
