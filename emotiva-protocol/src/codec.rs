//! Framing and parsing of the XML-over-UDP control protocol.
//!
//! Outbound frames are a fixed XML declaration immediately followed by a
//! document whose root element is the message type and whose children are
//! the commands, parameters carried as attributes. Inbound datagrams are
//! normalized before parsing because the receivers emit multi-line,
//! indentation-padded XML that is not valid as-is.

use xmltree::Element;

use crate::error::ProtocolError;

/// XML declaration prepended to every outbound frame. The document follows
/// immediately, with no separating newline.
pub const XML_HEADER: &[u8] = b"<?xml version=\"1.0\" encoding=\"utf-8\"?>";

/// A single protocol command: an element name plus its attribute parameters.
///
/// Parameters are kept in insertion order so encoded frames are
/// deterministic. An empty parameter list is valid; subscription commands
/// carry none at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub params: Vec<(String, String)>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Encode a message type and an ordered command list into a wire frame.
///
/// Each command produces its own child element in input order; repeated
/// names never collapse into one element. Command and parameter names are
/// taken from the fixed protocol vocabulary and are not escaped, parameter
/// values are.
pub fn encode(message_type: &str, commands: &[Command]) -> Vec<u8> {
    let mut doc = String::new();
    if commands.is_empty() {
        doc.push('<');
        doc.push_str(message_type);
        doc.push_str(" />");
    } else {
        doc.push('<');
        doc.push_str(message_type);
        doc.push('>');
        for command in commands {
            doc.push('<');
            doc.push_str(&command.name);
            for (key, value) in &command.params {
                doc.push(' ');
                doc.push_str(key);
                doc.push_str("=\"");
                push_escaped(&mut doc, value);
                doc.push('"');
            }
            doc.push_str(" />");
        }
        doc.push_str("</");
        doc.push_str(message_type);
        doc.push('>');
    }

    let mut frame = Vec::with_capacity(XML_HEADER.len() + doc.len());
    frame.extend_from_slice(XML_HEADER);
    frame.extend_from_slice(doc.as_bytes());
    frame
}

/// Decode a raw datagram into its response tree.
///
/// Strips line-internal indentation and joins the lines before parsing.
/// Unknown elements and attributes are carried through untouched so newer
/// device firmware does not break older clients.
pub fn decode(data: &[u8]) -> Result<Element, ProtocolError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ProtocolError::MalformedResponse(format!("invalid utf-8: {}", e)))?;
    let joined: String = text.lines().map(str::trim).collect();
    Element::parse(joined.as_bytes())
        .map_err(|e| ProtocolError::MalformedResponse(e.to_string()))
}

fn push_escaped(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
}
