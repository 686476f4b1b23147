//! Per-device session: descriptor, control channel, and notifications.
//!
//! A `Device` is built from a discovery advertisement, then `connect`ed:
//! that binds the private control socket, registers the device's notify
//! port with the shared multiplexer, and subscribes to the standard event
//! set. Synchronous exchanges go over the control socket with a bounded
//! drain loop; pushed notifications arrive through the multiplexer on its
//! dispatch thread.

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

use emotiva_notify::{Notifier, NotifyCallback};
use emotiva_protocol::{decode, encode, Command, Element};

use crate::error::DeviceError;

/// Event names every session subscribes to on connect.
pub const NOTIFY_EVENTS: [&str; 17] = [
    "power",
    "zone2_power",
    "source",
    "mode",
    "volume",
    "audio_input",
    "audio_bitstream",
    "video_input",
    "video_format",
    "input_1",
    "input_2",
    "input_3",
    "input_4",
    "input_5",
    "input_6",
    "input_7",
    "input_8",
];

/// Receive timeout bounding each read of a control exchange.
const CONTROL_TIMEOUT: Duration = Duration::from_millis(500);

const RECV_BUFFER_SIZE: usize = 2048;

/// Sink for decoded notification trees, invoked on the dispatch thread.
pub type EventSink = Arc<dyn Fn(Element) + Send + Sync>;

/// A single Emotiva receiver and its control session.
#[derive(Debug)]
pub struct Device {
    ip: IpAddr,
    name: String,
    model: String,
    protocol_version: Option<String>,
    control_port: u16,
    notify_port: u16,
    info_port: Option<u16>,
    setup_port_tcp: Option<u16>,
    control_socket: Option<UdpSocket>,
}

impl Device {
    /// Build a descriptor from a transponder advertisement.
    ///
    /// `name` and `model` fall back to `"Unknown"` when absent. The
    /// advertisement must carry both a control and a notify port; anything
    /// less is unusable and rejected outright.
    pub fn from_advertisement(ip: IpAddr, advertisement: &Element) -> Result<Self, DeviceError> {
        let name = child_text(advertisement, "name").unwrap_or_else(|| "Unknown".to_string());
        let model = child_text(advertisement, "model").unwrap_or_else(|| "Unknown".to_string());

        let control = advertisement.get_child("control").ok_or_else(|| {
            DeviceError::InvalidAdvertisement("missing control block".to_string())
        })?;
        let protocol_version = child_text(control, "version");
        let control_port = child_port(control, "controlPort");
        let notify_port = child_port(control, "notifyPort");
        let info_port = child_port(control, "infoPort");
        let setup_port_tcp = child_port(control, "setupPortTCP");

        let (Some(control_port), Some(notify_port)) = (control_port, notify_port) else {
            return Err(DeviceError::InvalidAdvertisement(
                "missing control or notify port".to_string(),
            ));
        };

        Ok(Self {
            ip,
            name,
            model,
            protocol_version,
            control_port,
            notify_port,
            info_port,
            setup_port_tcp,
            control_socket: None,
        })
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn control_port(&self) -> u16 {
        self.control_port
    }

    pub fn notify_port(&self) -> u16 {
        self.notify_port
    }

    pub fn info_port(&self) -> Option<u16> {
        self.info_port
    }

    pub fn setup_port_tcp(&self) -> Option<u16> {
        self.setup_port_tcp
    }

    /// Open the control channel and wire up notifications.
    ///
    /// Binds the control socket on the advertised port with a half-second
    /// receive timeout, registers this device's notify port and handler
    /// with `notifier`, then subscribes to [`NOTIFY_EVENTS`]. Decoded
    /// notification trees are passed to `on_event` on the dispatch thread;
    /// undecodable pushes are logged and skipped.
    pub fn connect(&mut self, notifier: &Notifier, on_event: EventSink) -> Result<(), DeviceError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, self.control_port))?;
        socket.set_read_timeout(Some(CONTROL_TIMEOUT))?;
        self.control_socket = Some(socket);

        let ip = self.ip;
        let handler: NotifyCallback = Arc::new(move |data: &[u8]| match decode(data) {
            Ok(tree) => on_event(tree),
            Err(e) => tracing::warn!("undecodable notification from {}: {}", ip, e),
        });
        notifier.register(self.ip, self.notify_port, handler)?;

        self.subscribe(&NOTIFY_EVENTS)?;
        Ok(())
    }

    /// Subscribe to notification events by name.
    pub fn subscribe(&self, events: &[&str]) -> Result<Vec<Element>, DeviceError> {
        let commands: Vec<Command> = events.iter().map(|event| Command::new(*event)).collect();
        self.send_request(&encode("emotivaSubscription", &commands), true)
    }

    /// Send one control command and collect any acknowledgements.
    pub fn send_command(&self, command: Command) -> Result<Vec<Element>, DeviceError> {
        self.send_request(&encode("emotivaControl", std::slice::from_ref(&command)), true)
    }

    /// Send a pre-framed request to the control port.
    ///
    /// With `ack` set, drains every reply that arrives before a read times
    /// out; some receivers answer a request with more than one frame. An
    /// empty result is a normal outcome, commands may ack silently or not
    /// at all. With `ack` unset the exchange is fire-and-forget.
    pub fn send_request(&self, payload: &[u8], ack: bool) -> Result<Vec<Element>, DeviceError> {
        let socket = self.control_socket.as_ref().ok_or(DeviceError::NotConnected)?;
        socket.send_to(payload, (self.ip, self.control_port))?;
        if !ack {
            return Ok(Vec::new());
        }
        drain_replies(socket)
    }
}

/// Collect decoded replies until a read times out.
///
/// The timeout is the exchange's normal end, not a failure; only genuine
/// socket errors and undecodable frames surface as `Err`.
fn drain_replies(socket: &UdpSocket) -> Result<Vec<Element>, DeviceError> {
    let mut replies = Vec::new();
    let mut buffer = [0u8; RECV_BUFFER_SIZE];
    loop {
        match socket.recv_from(&mut buffer) {
            Ok((len, _)) => replies.push(decode(&buffer[..len])?),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::TimedOut =>
            {
                return Ok(replies);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn child_text(parent: &Element, name: &str) -> Option<String> {
    parent
        .get_child(name)
        .and_then(|el| el.get_text())
        .map(|text| text.trim().to_string())
}

fn child_port(parent: &Element, name: &str) -> Option<u16> {
    child_text(parent, name).and_then(|text| text.parse().ok())
}
