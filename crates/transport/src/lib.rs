//! Raw print transports for ZPL labels.
//!
//! A [`Transport`] pushes bytes to a printer and nothing else: no status
//! queries, no job tracking. Two transports ship here:
//!
//! - [`TcpTransport`] for network printers on the RAW port (9100 by default).
//! - [`DeviceTransport`] for local device nodes and spool files such as
//!   `/dev/usb/lp0`.
//!
//! Wrap either in [`RetryTransport`] to retry transient failures with
//! exponential backoff. Everything is synchronous `std` I/O.

mod addr;
mod config;
mod device;
mod error;
mod retry;
mod tcp;

pub use addr::{DEFAULT_PORT, resolve_addr};
pub use config::{RetryConfig, Timeouts, TransportConfig};
pub use device::DeviceTransport;
pub use error::TransportError;
pub use retry::RetryTransport;
pub use tcp::TcpTransport;

/// Sends data to a printer.
pub trait Transport: Send {
    /// Send raw bytes.
    fn send_raw(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Send one rendered label.
    fn send_label(&mut self, label: &str) -> Result<(), TransportError> {
        self.send_raw(label.as_bytes())
    }

    /// Re-establish the underlying connection after a failure.
    ///
    /// Transports without a connection have nothing to do.
    fn reconnect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).send_raw(data)
    }

    fn send_label(&mut self, label: &str) -> Result<(), TransportError> {
        (**self).send_label(label)
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        (**self).reconnect()
    }
}
