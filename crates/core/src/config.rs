//! Configuration types for batch runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the batch does when a sink rejects a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Record the failure and stop; later rows are never sent.
    #[default]
    FailFast,
    /// Record the failure and carry on with the next row.
    ContinueOnError,
}

/// Tuning for a [`BatchJob`](crate::BatchJob).
///
/// The default throttle gives a live printer spooler 50 ms between labels.
/// File output is never throttled.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Pause between consecutive labels sent to a printer.
    pub throttle: Duration,
    /// Failure handling for rejected labels.
    pub error_policy: ErrorPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(50),
            error_policy: ErrorPolicy::FailFast,
        }
    }
}
