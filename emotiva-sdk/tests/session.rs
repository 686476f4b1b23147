//! End-to-end session tests over loopback sockets.
//!
//! The control socket binds the device's advertised port locally, so on
//! loopback a session's own outbound frames come straight back to it as
//! replies; `connect` simply drains them along with anything else, which
//! keeps these tests self-contained on one host.

use std::net::{IpAddr, UdpSocket};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use emotiva_sdk::{Device, Element, Notifier};

const RECV_WAIT: Duration = Duration::from_secs(2);

/// Pick a port that was free a moment ago.
fn free_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.local_addr().unwrap().port()
}

fn loopback_advertisement(control_port: u16, notify_port: u16) -> Element {
    let xml = format!(
        r#"
        <emotivaTransponder>
            <name>Bench XMC-1</name>
            <model>XMC-1</model>
            <control>
                <version>2.0</version>
                <controlPort>{control_port}</controlPort>
                <notifyPort>{notify_port}</notifyPort>
            </control>
        </emotivaTransponder>
        "#
    );
    Element::parse(xml.as_bytes()).unwrap()
}

#[test]
fn test_connect_registers_and_delivers_notifications() {
    let notifier = Notifier::start().unwrap();
    let control_port = free_port();
    let notify_port = free_port();

    let ip: IpAddr = "127.0.0.1".parse().unwrap();
    let advertisement = loopback_advertisement(control_port, notify_port);
    let mut device = Device::from_advertisement(ip, &advertisement).unwrap();

    let (tx, rx) = mpsc::channel::<Element>();
    device
        .connect(&notifier, Arc::new(move |tree| {
            let _ = tx.send(tree);
        }))
        .unwrap();

    // Connect bound the control socket, registered the notify handler, and
    // got the initial subscription exchange through without error.
    assert!(notifier.is_registered(ip));

    // A garbled push is skipped by the handler; the well-formed one that
    // follows must still arrive, proving dispatch survived it.
    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    sender
        .send_to(b"not xml at all <<<", ("127.0.0.1", notify_port))
        .unwrap();
    sender
        .send_to(
            b"<emotivaNotify>\n  <volume value=\"-20\" visible=\"true\" />\n</emotivaNotify>",
            ("127.0.0.1", notify_port),
        )
        .unwrap();

    let event = rx.recv_timeout(RECV_WAIT).unwrap();
    assert_eq!(event.name, "emotivaNotify");
    assert_eq!(event.get_child("volume").unwrap().attributes["value"], "-20");

    // The garbled datagram never reached the sink.
    assert!(rx.try_recv().is_err());

    notifier.shutdown();
}
