//! Transport configuration.

use std::time::Duration;

/// Timeouts plus retry settings for a transport.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Socket timeouts.
    pub timeouts: Timeouts,
    /// Retry policy used by [`RetryTransport`](crate::RetryTransport).
    pub retry: RetryConfig,
}

/// Socket timeouts.
///
/// The write timeout is long because labels with embedded graphics can be
/// several hundred kilobytes.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed to establish a connection.
    pub connect: Duration,
    /// Time allowed for one write to complete.
    pub write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            write: Duration::from_secs(30),
        }
    }
}

/// Exponential backoff settings.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts per send, counting the first one. Must be at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Randomize each delay within `[delay / 2, delay]`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that tries once and never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}
