//! Background dispatcher for unsolicited receiver notifications.
//!
//! Receivers push status updates over UDP without connection context, so
//! demultiplexing is address-based: one shared socket is bound per notify
//! port, and each inbound datagram is routed to the callback registered
//! for its source IP. A dedicated thread drains a `mio::Poll` readiness
//! set; registration happens from any other thread through a cloned poll
//! registry while the loop keeps running.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use mio::net::UdpSocket as MioUdpSocket;
use mio::{Events, Interest, Poll, Registry, Token};
use parking_lot::Mutex;

use crate::error::NotifyError;

/// Handler invoked with the raw bytes of each datagram from a registered
/// source address. Runs on the dispatch thread; must not block for long.
pub type NotifyCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Largest notification datagram the protocol produces.
const RECV_BUFFER_SIZE: usize = 2048;

/// Upper bound on one poll wait, so the running flag is rechecked promptly.
const POLL_TICK: Duration = Duration::from_millis(250);

/// Joint registration table. A single lock guards both maps so register
/// and dispatch never observe a half-updated pairing.
#[derive(Default)]
struct Registrations {
    tokens_by_port: HashMap<u16, Token>,
    sockets_by_token: HashMap<Token, Arc<MioUdpSocket>>,
    callbacks: HashMap<IpAddr, NotifyCallback>,
    next_token: usize,
}

/// Notification multiplexer with an explicit lifecycle.
///
/// `start` spawns the dispatch thread; `shutdown` (or drop) signals it and
/// joins. Listening sockets are owned by the multiplexer and closed when
/// the last reference goes away after shutdown.
///
/// Multiple devices may share one notify port; each distinct port gets
/// exactly one bound socket. Registering an address that already has a
/// callback is a no-op: the first registration wins.
pub struct Notifier {
    registry: Registry,
    state: Arc<Mutex<Registrations>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Notifier {
    /// Start the dispatch thread with an empty registration table.
    pub fn start() -> Result<Self, NotifyError> {
        let poll = Poll::new()?;
        let registry = poll.registry().try_clone()?;
        let state = Arc::new(Mutex::new(Registrations::default()));
        let running = Arc::new(AtomicBool::new(true));

        let handle = std::thread::Builder::new()
            .name("emotiva-notify".to_string())
            .spawn({
                let state = Arc::clone(&state);
                let running = Arc::clone(&running);
                move || run_loop(poll, state, running)
            })?;

        Ok(Self {
            registry,
            state,
            running,
            handle: Some(handle),
        })
    }

    /// Register a device's notify port and handler.
    ///
    /// Binds a shared socket for `port` if this is the first device on it,
    /// and installs `callback` for `address` unless one is already present.
    /// Safe to call from any thread, including from inside a callback.
    pub fn register(
        &self,
        address: IpAddr,
        port: u16,
        callback: NotifyCallback,
    ) -> Result<(), NotifyError> {
        let mut state = self.state.lock();

        if !state.tokens_by_port.contains_key(&port) {
            let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
            socket.set_nonblocking(true)?;
            let mut socket = MioUdpSocket::from_std(socket);

            let token = Token(state.next_token);
            state.next_token += 1;
            self.registry
                .register(&mut socket, token, Interest::READABLE)?;

            state.tokens_by_port.insert(port, token);
            state.sockets_by_token.insert(token, Arc::new(socket));
            tracing::debug!("listening for notifications on port {}", port);
        }

        if state.callbacks.contains_key(&address) {
            tracing::debug!("handler for {} already registered, keeping it", address);
        } else {
            state.callbacks.insert(address, callback);
        }
        Ok(())
    }

    /// Whether a handler is installed for `address`.
    ///
    /// Introspection only; dispatch never consults it. Useful for waiting
    /// on a registration made from another thread or from inside a
    /// callback, since `register` on an already-known address is a no-op
    /// and gives no other signal.
    pub fn is_registered(&self, address: IpAddr) -> bool {
        self.state.lock().callbacks.contains_key(&address)
    }

    /// Stop the dispatch thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(mut poll: Poll, state: Arc<Mutex<Registrations>>, running: Arc<AtomicBool>) {
    let mut events = Events::with_capacity(16);
    let mut buffer = [0u8; RECV_BUFFER_SIZE];

    while running.load(Ordering::Relaxed) {
        if let Err(e) = poll.poll(&mut events, Some(POLL_TICK)) {
            if e.kind() != io::ErrorKind::Interrupted {
                tracing::warn!("notification poll failed: {}", e);
            }
            continue;
        }

        for event in events.iter() {
            let socket = state.lock().sockets_by_token.get(&event.token()).cloned();
            let Some(socket) = socket else { continue };
            drain_socket(&socket, &state, &mut buffer);
        }
    }

    tracing::debug!("notification dispatch loop stopped");
}

/// Read every queued datagram off one ready socket and dispatch each.
///
/// A receive failure here is recoverable: log it and move on so one bad
/// socket never takes down dispatch for the others.
fn drain_socket(socket: &MioUdpSocket, state: &Mutex<Registrations>, buffer: &mut [u8]) {
    loop {
        let (len, source) = match socket.recv_from(buffer) {
            Ok(received) => received,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => {
                tracing::warn!("notification receive failed: {}", e);
                break;
            }
        };

        let callback = state.lock().callbacks.get(&source.ip()).cloned();
        match callback {
            // Invoked outside the lock; the handler may itself register.
            Some(callback) => callback(&buffer[..len]),
            // Expected between a device's first push and its session
            // finishing registration. Dropped without complaint.
            None => tracing::trace!("dropping datagram from unregistered source {}", source),
        }
    }
}
