//! TCP transport against a mock printer on localhost.

use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::thread;
use std::time::Duration;

use zpl_merge_transport::{
    RetryConfig, RetryTransport, TcpTransport, Transport, TransportConfig, TransportError,
};

/// Accepts `connections` clients in turn and returns what each one sent.
fn mock_printer(connections: usize) -> (SocketAddr, thread::JoinHandle<Vec<Vec<u8>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        (0..connections)
            .map(|_| {
                let (mut stream, _) = listener.accept().unwrap();
                stream
                    .set_read_timeout(Some(Duration::from_secs(5)))
                    .unwrap();
                let mut received = Vec::new();
                let _ = stream.read_to_end(&mut received);
                received
            })
            .collect()
    });
    (addr, handle)
}

fn fast_config() -> TransportConfig {
    let mut cfg = TransportConfig::default();
    cfg.timeouts.connect = Duration::from_secs(2);
    cfg.timeouts.write = Duration::from_secs(2);
    cfg
}

#[test]
fn sends_labels_in_order() {
    let (addr, server) = mock_printer(1);

    let mut printer = TcpTransport::connect(&addr.to_string(), fast_config()).unwrap();
    assert_eq!(printer.remote_addr(), addr);
    printer.send_label("^XAone^XZ").unwrap();
    printer.send_label("^XAtwo^XZ").unwrap();
    drop(printer);

    let received = server.join().unwrap();
    assert_eq!(received, [b"^XAone^XZ^XAtwo^XZ".to_vec()]);
}

#[test]
fn reconnect_opens_a_fresh_connection() {
    let (addr, server) = mock_printer(2);

    let mut printer = TcpTransport::connect(&addr.to_string(), fast_config()).unwrap();
    printer.send_label("^XAfirst^XZ").unwrap();
    printer.reconnect().unwrap();
    printer.send_label("^XAsecond^XZ").unwrap();
    drop(printer);

    let received = server.join().unwrap();
    assert_eq!(
        received,
        [b"^XAfirst^XZ".to_vec(), b"^XAsecond^XZ".to_vec()]
    );
}

#[test]
fn retry_wrapper_passes_through_on_success() {
    let (addr, server) = mock_printer(1);

    let tcp = TcpTransport::connect(&addr.to_string(), fast_config()).unwrap();
    let mut printer = RetryTransport::new(tcp, RetryConfig::default());
    printer.send_label("^XAok^XZ").unwrap();
    drop(printer);

    assert_eq!(server.join().unwrap(), [b"^XAok^XZ".to_vec()]);
}

#[test]
fn refused_connection_is_permanent() {
    // Bind then drop to get a port nobody is listening on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let err = TcpTransport::connect(&addr.to_string(), fast_config()).unwrap_err();

    assert!(matches!(err, TransportError::ConnectionRefused { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn unresolvable_host_fails_before_connecting() {
    let err = TcpTransport::connect("no-such-printer.invalid", fast_config()).unwrap_err();
    assert!(matches!(err, TransportError::NoAddressFound(_)));
}
