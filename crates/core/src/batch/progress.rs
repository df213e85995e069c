//! Progress reporting for batch runs.

use std::fmt;
use std::sync::mpsc::Sender;

use serde::Serialize;

use super::BatchResult;

/// The kind of work a batch is doing, shown in status text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Sending labels to a printer.
    Printing,
    /// Rendering labels into an output file.
    Generating,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Printing => f.write_str("Printing"),
            Phase::Generating => f.write_str("Generating"),
        }
    }
}

/// One step of batch progress: `current` of `total` labels handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Labels handled so far (1-based).
    pub current: usize,
    /// Labels in the batch.
    pub total: usize,
    /// What the batch is doing.
    pub phase: Phase,
}

impl Progress {
    /// Completion percentage, `current / total * 100`.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.current as f64 / self.total as f64 * 100.0
    }

    /// Status line, e.g. `Printing: 2 of 3 labels...`.
    pub fn status_text(&self) -> String {
        format!("{}: {} of {} labels...", self.phase, self.current, self.total)
    }
}

/// Events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// The row loop is about to start.
    Started {
        /// Labels the batch will produce.
        total: usize,
        /// What the batch is doing.
        phase: Phase,
    },
    /// A label was handled.
    Progress(Progress),
    /// The batch reached a terminal state.
    Finished(BatchResult),
}

/// Receives batch progress. Callbacks return nothing and must not block for
/// long; the row loop waits for them.
pub trait ProgressObserver {
    /// The row loop is about to start.
    fn on_started(&mut self, _total: usize, _phase: Phase) {}

    /// A label was handled.
    fn on_progress(&mut self, progress: Progress);

    /// The batch ended; see [`BatchResult::is_error`].
    fn on_finished(&mut self, result: &BatchResult);
}

impl<F: FnMut(BatchEvent)> ProgressObserver for F {
    fn on_started(&mut self, total: usize, phase: Phase) {
        self(BatchEvent::Started { total, phase });
    }

    fn on_progress(&mut self, progress: Progress) {
        self(BatchEvent::Progress(progress));
    }

    fn on_finished(&mut self, result: &BatchResult) {
        self(BatchEvent::Finished(result.clone()));
    }
}

/// Forwards events over a channel. A dropped receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelObserver(Sender<BatchEvent>);

impl ChannelObserver {
    /// Wrap a channel sender.
    pub fn new(tx: Sender<BatchEvent>) -> Self {
        Self(tx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_started(&mut self, total: usize, phase: Phase) {
        let _ = self.0.send(BatchEvent::Started { total, phase });
    }

    fn on_progress(&mut self, progress: Progress) {
        let _ = self.0.send(BatchEvent::Progress(progress));
    }

    fn on_finished(&mut self, result: &BatchResult) {
        let _ = self.0.send(BatchEvent::Finished(result.clone()));
    }
}
