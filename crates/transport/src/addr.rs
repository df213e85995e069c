//! Printer address parsing.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use crate::TransportError;

/// The RAW printing port most label printers listen on.
pub const DEFAULT_PORT: u16 = 9100;

/// Resolve `IP`, `IP:PORT`, `host`, or `host:PORT` to a socket address.
///
/// Bare addresses get [`DEFAULT_PORT`]. When a hostname resolves to several
/// addresses the first one is used.
pub fn resolve_addr(input: &str) -> Result<SocketAddr, TransportError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TransportError::InvalidAddress(input.to_string()));
    }

    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    // `host:PORT` first, then the bare host on the default port.
    first(input.to_socket_addrs())
        .or_else(|| first((input, DEFAULT_PORT).to_socket_addrs()))
        .ok_or_else(|| TransportError::NoAddressFound(input.to_string()))
}

fn first(lookup: std::io::Result<impl Iterator<Item = SocketAddr>>) -> Option<SocketAddr> {
    lookup.ok()?.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_and_port_forms() {
        let a = resolve_addr("192.168.1.55:6101").unwrap();
        assert_eq!(a.ip().to_string(), "192.168.1.55");
        assert_eq!(a.port(), 6101);

        let b = resolve_addr("192.168.1.55").unwrap();
        assert_eq!(b.port(), DEFAULT_PORT);
    }

    #[test]
    fn ipv6_forms() {
        assert_eq!(resolve_addr("[::1]:9200").unwrap().port(), 9200);
        let bare = resolve_addr("::1").unwrap();
        assert!(bare.ip().is_loopback());
        assert_eq!(bare.port(), DEFAULT_PORT);
    }

    #[test]
    fn localhost_forms() {
        assert_eq!(resolve_addr("localhost:9101").unwrap().port(), 9101);
        let bare = resolve_addr(" localhost ").unwrap();
        assert!(bare.ip().is_loopback());
        assert_eq!(bare.port(), DEFAULT_PORT);
    }

    #[test]
    fn blank_is_invalid() {
        assert!(matches!(
            resolve_addr("   "),
            Err(TransportError::InvalidAddress(_))
        ));
    }

    #[test]
    fn unresolvable_host() {
        match resolve_addr("no-such-printer.invalid") {
            Err(TransportError::NoAddressFound(host)) => {
                assert_eq!(host, "no-such-printer.invalid");
            }
            other => panic!("expected NoAddressFound, got {other:?}"),
        }
    }
}
