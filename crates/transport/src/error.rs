//! Transport errors.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// A failure to deliver bytes to a printer.
///
/// [`is_retryable`](Self::is_retryable) separates transient failures from
/// ones that will not go away on their own.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The printer refused the connection.
    #[error("connection refused: {addr}")]
    ConnectionRefused {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// No answer within the connect timeout.
    #[error("connection timed out: {addr} ({timeout:?})")]
    ConnectionTimeout {
        /// The address that was attempted.
        addr: String,
        /// The timeout that elapsed.
        timeout: Duration,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Connecting failed for another reason.
    #[error("connection failed: {addr}")]
    ConnectionFailed {
        /// The address that was attempted.
        addr: String,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The peer closed or reset the connection mid-send.
    #[error("connection closed by printer")]
    ConnectionClosed,

    /// The address string is malformed.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// Name resolution returned nothing.
    #[error("no address found for {0}")]
    NoAddressFound(String),

    /// The device node or spool file could not be opened.
    #[error("could not open device {}", .path.display())]
    DeviceOpen {
        /// The device path.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A write did not complete.
    #[error("write failed: {0}")]
    WriteFailed(#[source] io::Error),

    /// Every attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// The final attempt's error.
        #[source]
        last_error: Box<TransportError>,
    },

    /// The configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// `true` for failures worth another attempt: timeouts, dropped
    /// connections, and failed writes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionTimeout { .. }
                | TransportError::ConnectionClosed
                | TransportError::WriteFailed(_)
        )
    }

    /// Classify a write error: a dropped peer is [`ConnectionClosed`], anything
    /// else is [`WriteFailed`].
    ///
    /// [`ConnectionClosed`]: TransportError::ConnectionClosed
    /// [`WriteFailed`]: TransportError::WriteFailed
    pub(crate) fn from_write(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed,
            _ => TransportError::WriteFailed(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(
            TransportError::ConnectionTimeout {
                addr: "x".into(),
                timeout: Duration::from_secs(1),
                source: io::Error::new(io::ErrorKind::TimedOut, "t"),
            }
            .is_retryable()
        );
        assert!(TransportError::ConnectionClosed.is_retryable());
        assert!(TransportError::WriteFailed(io::Error::other("t")).is_retryable());
    }

    #[test]
    fn permanent_errors_are_not_retryable() {
        assert!(
            !TransportError::ConnectionRefused {
                addr: "x".into(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "t"),
            }
            .is_retryable()
        );
        assert!(!TransportError::InvalidAddress("x".into()).is_retryable());
        assert!(!TransportError::NoAddressFound("x".into()).is_retryable());
        assert!(
            !TransportError::DeviceOpen {
                path: "/dev/null/x".into(),
                source: io::Error::other("t"),
            }
            .is_retryable()
        );
        assert!(!TransportError::InvalidConfig("x".into()).is_retryable());
        assert!(
            !TransportError::RetriesExhausted {
                attempts: 3,
                last_error: Box::new(TransportError::ConnectionClosed),
            }
            .is_retryable()
        );
    }

    #[test]
    fn write_errors_classified_by_kind() {
        let closed = TransportError::from_write(io::ErrorKind::BrokenPipe.into());
        assert!(matches!(closed, TransportError::ConnectionClosed));
        let other = TransportError::from_write(io::ErrorKind::TimedOut.into());
        assert!(matches!(other, TransportError::WriteFailed(_)));
    }

    #[test]
    fn exhausted_message_includes_last_error() {
        let err = TransportError::RetriesExhausted {
            attempts: 2,
            last_error: Box::new(TransportError::ConnectionClosed),
        };
        assert_eq!(
            err.to_string(),
            "retries exhausted after 2 attempts: connection closed by printer"
        );
    }
}
