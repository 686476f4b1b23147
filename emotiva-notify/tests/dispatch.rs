//! Dispatch tests exercising the multiplexer over real loopback sockets.
//!
//! Source-address routing needs datagrams from distinct source IPs, so the
//! senders bind the 127.0.0.1 and 127.0.0.2 loopback aliases.

use std::net::{IpAddr, UdpSocket};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use emotiva_notify::Notifier;

const RECV_WAIT: Duration = Duration::from_secs(2);

/// Pick a port that was free a moment ago.
fn free_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

fn sender_on(ip: &str) -> UdpSocket {
    UdpSocket::bind((ip, 0)).unwrap()
}

#[test]
fn test_datagrams_route_by_source_address() {
    let notifier = Notifier::start().unwrap();
    let port = free_port();

    let (tx_a, rx_a) = mpsc::channel::<Vec<u8>>();
    let (tx_b, rx_b) = mpsc::channel::<Vec<u8>>();

    let addr_a: IpAddr = "127.0.0.1".parse().unwrap();
    let addr_b: IpAddr = "127.0.0.2".parse().unwrap();
    notifier
        .register(addr_a, port, Arc::new(move |data| {
            let _ = tx_a.send(data.to_vec());
        }))
        .unwrap();
    notifier
        .register(addr_b, port, Arc::new(move |data| {
            let _ = tx_b.send(data.to_vec());
        }))
        .unwrap();

    sender_on("127.0.0.1")
        .send_to(b"for-a", ("127.0.0.1", port))
        .unwrap();
    sender_on("127.0.0.2")
        .send_to(b"for-b", ("127.0.0.1", port))
        .unwrap();

    assert_eq!(rx_a.recv_timeout(RECV_WAIT).unwrap(), b"for-a");
    assert_eq!(rx_b.recv_timeout(RECV_WAIT).unwrap(), b"for-b");

    // Neither handler saw the other device's traffic.
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());

    notifier.shutdown();
}

#[test]
fn test_first_registration_wins() {
    let notifier = Notifier::start().unwrap();
    let port = free_port();
    let addr: IpAddr = "127.0.0.1".parse().unwrap();

    let (tx_first, rx_first) = mpsc::channel::<Vec<u8>>();
    let (tx_second, rx_second) = mpsc::channel::<Vec<u8>>();

    notifier
        .register(addr, port, Arc::new(move |data| {
            let _ = tx_first.send(data.to_vec());
        }))
        .unwrap();
    // Re-registration of the same address is a no-op.
    notifier
        .register(addr, port, Arc::new(move |data| {
            let _ = tx_second.send(data.to_vec());
        }))
        .unwrap();

    sender_on("127.0.0.1")
        .send_to(b"hello", ("127.0.0.1", port))
        .unwrap();

    assert_eq!(rx_first.recv_timeout(RECV_WAIT).unwrap(), b"hello");
    assert!(rx_second.try_recv().is_err());

    notifier.shutdown();
}

#[test]
fn test_unregistered_source_is_dropped_silently() {
    let notifier = Notifier::start().unwrap();
    let port = free_port();
    let addr: IpAddr = "127.0.0.1".parse().unwrap();

    let (tx, rx) = mpsc::channel::<Vec<u8>>();
    notifier
        .register(addr, port, Arc::new(move |data| {
            let _ = tx.send(data.to_vec());
        }))
        .unwrap();

    // No handler for 127.0.0.2; its datagram must vanish without harming
    // delivery for the registered device.
    sender_on("127.0.0.2")
        .send_to(b"stray", ("127.0.0.1", port))
        .unwrap();
    sender_on("127.0.0.1")
        .send_to(b"expected", ("127.0.0.1", port))
        .unwrap();

    assert_eq!(rx.recv_timeout(RECV_WAIT).unwrap(), b"expected");
    assert!(rx.try_recv().is_err());

    notifier.shutdown();
}

#[test]
fn test_callback_may_register_another_device() {
    let notifier = Arc::new(Notifier::start().unwrap());
    let port = free_port();
    let addr_a: IpAddr = "127.0.0.1".parse().unwrap();
    let addr_b: IpAddr = "127.0.0.2".parse().unwrap();

    let (tx_b, rx_b) = mpsc::channel::<Vec<u8>>();
    let reentrant = Arc::downgrade(&notifier);
    notifier
        .register(addr_a, port, Arc::new(move |_data| {
            // Dispatch runs outside the registration lock, so this must
            // not deadlock.
            if let Some(notifier) = reentrant.upgrade() {
                let tx_b = tx_b.clone();
                notifier
                    .register(addr_b, port, Arc::new(move |data| {
                        let _ = tx_b.send(data.to_vec());
                    }))
                    .unwrap();
            }
        }))
        .unwrap();

    sender_on("127.0.0.1")
        .send_to(b"trigger", ("127.0.0.1", port))
        .unwrap();

    // Wait until the reentrant registration has landed.
    let deadline = std::time::Instant::now() + RECV_WAIT;
    while !notifier.is_registered(addr_b) {
        assert!(std::time::Instant::now() < deadline, "registration never landed");
        std::thread::sleep(Duration::from_millis(10));
    }

    sender_on("127.0.0.2")
        .send_to(b"second", ("127.0.0.1", port))
        .unwrap();
    assert_eq!(rx_b.recv_timeout(RECV_WAIT).unwrap(), b"second");
}

#[test]
fn test_shutdown_joins_dispatch_thread() {
    let notifier = Notifier::start().unwrap();
    let port = free_port();
    notifier
        .register("127.0.0.1".parse().unwrap(), port, Arc::new(|_| {}))
        .unwrap();

    // Must return promptly rather than hanging on the poll loop.
    notifier.shutdown();
}
