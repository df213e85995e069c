//! Retry with exponential backoff.

use std::time::{Duration, SystemTime};

use tracing::warn;

use crate::{RetryConfig, Transport, TransportError};

/// Wraps a transport and retries retryable failures.
///
/// Between attempts it sleeps for an exponentially growing delay and asks
/// the inner transport to [`reconnect`](Transport::reconnect). A failed
/// reconnect is ignored; the next attempt reports what is wrong.
#[derive(Debug)]
pub struct RetryTransport<T> {
    inner: T,
    config: RetryConfig,
}

impl<T> RetryTransport<T> {
    /// Wrap `inner` with `config`.
    pub fn new(inner: T, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Unwrap, returning the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> Transport for RetryTransport<T> {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let max = self.config.max_attempts;
        if max == 0 {
            return Err(TransportError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }

        let mut attempt = 0;
        loop {
            let err = match self.inner.send_raw(data) {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };
            attempt += 1;
            if attempt >= max {
                return Err(TransportError::RetriesExhausted {
                    attempts: attempt,
                    last_error: Box::new(err),
                });
            }

            let delay = backoff(&self.config, attempt - 1);
            warn!(attempt, max, ?delay, error = %err, "send failed, retrying");
            std::thread::sleep(delay);
            if let Err(e) = self.inner.reconnect() {
                warn!(error = %e, "reconnect failed");
            }
        }
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.inner.reconnect()
    }
}

/// Delay before retry number `retry` (0-based):
/// `min(initial * 2^retry, max)`, jittered into `[d / 2, d]` when enabled.
fn backoff(config: &RetryConfig, retry: u32) -> Duration {
    let delay = config
        .initial_delay
        .saturating_mul(2u32.saturating_pow(retry))
        .min(config.max_delay);
    if !config.jitter {
        return delay;
    }

    let half = delay / 2;
    let span = delay.as_nanos() - half.as_nanos();
    if span == 0 {
        return delay;
    }
    // Clock nanoseconds are enough entropy to spread reconnects apart.
    let seed = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    let offset = u64::try_from(u128::from(seed) % span).unwrap_or(0);
    half + Duration::from_nanos(offset)
}
