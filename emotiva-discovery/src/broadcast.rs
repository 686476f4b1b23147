//! Broadcast ping / timed collection for receiver discovery.
//!
//! A discovery round sends one `emotivaPing` broadcast to the well-known
//! request port and then reads the fixed response port until no reply has
//! arrived for the configured wait. The wait is a rolling inactivity
//! timeout: every received datagram arms it again, so a slow burst of
//! replies is collected in full.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use emotiva_protocol::decode;

use crate::error::{DiscoveryError, Result};
use crate::{DiscoveredDevice, DISCOVER_REQUEST_PORT, DISCOVER_RESPONSE_PORT};

/// Discovery client owning the fixed response-listening socket.
pub(crate) struct BroadcastClient {
    response_socket: UdpSocket,
}

impl BroadcastClient {
    /// Bind the response socket and arm its rolling receive timeout.
    pub fn new(response_wait: Duration) -> Result<Self> {
        let response_socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, DISCOVER_RESPONSE_PORT))
            .map_err(|e| DiscoveryError::Network(format!("failed to bind response socket: {}", e)))?;
        response_socket
            .set_read_timeout(Some(response_wait))
            .map_err(|e| DiscoveryError::Network(format!("failed to set read timeout: {}", e)))?;

        Ok(Self { response_socket })
    }

    /// Send one broadcast ping and return an iterator over the replies.
    pub fn ping(&self) -> Result<ResponseIterator<'_>> {
        let request_socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
            .map_err(|e| DiscoveryError::Network(format!("failed to bind request socket: {}", e)))?;
        request_socket
            .set_broadcast(true)
            .map_err(|e| DiscoveryError::Network(format!("failed to enable broadcast: {}", e)))?;

        let frame = emotiva_protocol::encode("emotivaPing", &[]);
        request_socket
            .send_to(&frame, (Ipv4Addr::BROADCAST, DISCOVER_REQUEST_PORT))
            .map_err(|e| DiscoveryError::Network(format!("failed to send ping: {}", e)))?;

        Ok(ResponseIterator::new(&self.response_socket))
    }
}

/// Iterator over advertisement replies, in arrival order.
///
/// Ends when a read blocks for longer than the socket's receive timeout.
/// Datagrams that fail to decode are skipped rather than aborting the
/// round; one garbled reply must not blind the client to every other
/// device on the network.
pub(crate) struct ResponseIterator<'a> {
    socket: &'a UdpSocket,
    buffer: [u8; 2048],
    finished: bool,
}

impl<'a> ResponseIterator<'a> {
    pub(crate) fn new(socket: &'a UdpSocket) -> Self {
        Self {
            socket,
            buffer: [0; 2048],
            finished: false,
        }
    }
}

impl<'a> Iterator for ResponseIterator<'a> {
    type Item = Result<DiscoveredDevice>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let (size, source): (usize, SocketAddr) = match self.socket.recv_from(&mut self.buffer)
            {
                Ok(received) => received,
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(DiscoveryError::Network(format!("socket error: {}", e))));
                }
            };

            match decode(&self.buffer[..size]) {
                Ok(advertisement) => {
                    return Some(Ok(DiscoveredDevice {
                        ip: source.ip(),
                        advertisement,
                    }));
                }
                Err(e) => {
                    tracing::debug!("skipping undecodable reply from {}: {}", source, e);
                }
            }
        }
    }
}
