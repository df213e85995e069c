//! TCP transport to a printer's RAW port.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tracing::debug;

use crate::addr::resolve_addr;
use crate::{Transport, TransportConfig, TransportError};

const KEEPALIVE: Duration = Duration::from_secs(60);

/// A connection to a network printer.
///
/// The socket has Nagle disabled, TCP keepalive on, and the write timeout
/// from [`TransportConfig`]. Dropping the transport shuts the socket down.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    addr: SocketAddr,
    config: TransportConfig,
}

impl TcpTransport {
    /// Connect to `addr` (any form [`resolve_addr`] accepts).
    pub fn connect(addr: &str, config: TransportConfig) -> Result<Self, TransportError> {
        let addr = resolve_addr(addr)?;
        let stream = open(addr, &config)?;
        debug!(%addr, "connected to printer");
        Ok(Self {
            stream,
            addr,
            config,
        })
    }

    /// The resolved peer address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Transport for TcpTransport {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream
            .write_all(data)
            .and_then(|()| self.stream.flush())
            .map_err(TransportError::from_write)
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        let _ = self.stream.shutdown(Shutdown::Both);
        self.stream = open(self.addr, &self.config)?;
        debug!(addr = %self.addr, "reconnected to printer");
        Ok(())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

fn open(addr: SocketAddr, config: &TransportConfig) -> Result<TcpStream, TransportError> {
    let connect = config.timeouts.connect;
    let stream = TcpStream::connect_timeout(&addr, connect).map_err(|source| {
        let addr = addr.to_string();
        match source.kind() {
            io::ErrorKind::ConnectionRefused => TransportError::ConnectionRefused { addr, source },
            io::ErrorKind::TimedOut => TransportError::ConnectionTimeout {
                addr,
                timeout: connect,
                source,
            },
            _ => TransportError::ConnectionFailed { addr, source },
        }
    })?;

    tune(&stream, config).map_err(|source| TransportError::ConnectionFailed {
        addr: addr.to_string(),
        source,
    })?;
    Ok(stream)
}

fn tune(stream: &TcpStream, config: &TransportConfig) -> io::Result<()> {
    stream.set_nodelay(true)?;
    stream.set_write_timeout(Some(config.timeouts.write))?;

    let keepalive = TcpKeepalive::new().with_time(KEEPALIVE);
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    let keepalive = keepalive.with_interval(KEEPALIVE);
    SockRef::from(stream).set_tcp_keepalive(&keepalive)
}
