//! Batch orchestration.
//!
//! A [`BatchJob`] decides between one label and one label per table row,
//! renders each label in row order, hands it to the [`Sink`], and reports
//! progress. Failures are caught at the row boundary; callers only ever see
//! a [`BatchResult`].
//!
//! # Mode selection
//!
//! The job runs one label per row only when a table was supplied **and** at
//! least one binding is a column reference. Otherwise it renders a single
//! label with no row, so column bindings fall back to empty text.

mod handle;
mod progress;
mod sink;

pub use handle::{BatchHandle, CancelToken};
pub use progress::{BatchEvent, ChannelObserver, Phase, Progress, ProgressObserver};
pub use sink::{
    AtomicFileWriter, BatchWriter, LabelPrinter, OutputFormat, PrintTarget, SaveTarget, Sink,
};

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::binding::PlaceholderBinding;
use crate::config::{BatchOptions, ErrorPolicy};
use crate::merge::render;
use crate::table::{DataTable, RowRef};
use crate::template::Template;

/// Lifecycle of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created, not started.
    Idle,
    /// The row loop is running.
    Running,
    /// Every label was handled.
    Completed,
    /// The loop finished but some labels failed (continue-on-error only).
    CompletedWithErrors,
    /// Stopped early by a failure or cancellation.
    Aborted,
}

impl JobState {
    /// `true` for the three end states.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::CompletedWithErrors | JobState::Aborted
        )
    }
}

/// How many labels a job renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BatchMode {
    /// One label, rendered without a row.
    Single,
    /// One label per table row.
    Rows {
        /// Number of table rows.
        rows: usize,
    },
}

impl BatchMode {
    /// Labels this mode renders.
    pub fn total(self) -> usize {
        match self {
            BatchMode::Single => 1,
            BatchMode::Rows { rows } => rows,
        }
    }
}

/// A recorded failure inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchFailure {
    /// The sink rejected one label. `row` is 0-based.
    #[error("label {} failed: {message}", .row + 1)]
    Row {
        /// Row index (0-based).
        row: usize,
        /// Sink message.
        message: String,
    },
    /// Writing the batch file failed.
    #[error("could not write {}: {message}", .path.display())]
    Io {
        /// The destination path.
        path: PathBuf,
        /// Writer message.
        message: String,
    },
}

/// The outcome of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    /// Terminal state.
    pub state: JobState,
    /// Labels the sink accepted.
    pub processed: usize,
    /// Labels the batch intended to produce.
    pub total: usize,
    /// Human-readable summary.
    pub message: String,
    /// Failures in the order they happened.
    pub failures: Vec<BatchFailure>,
    /// The written file, for successful save runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl BatchResult {
    /// `true` unless the batch completed cleanly.
    pub fn is_error(&self) -> bool {
        self.state != JobState::Completed
    }

    fn aborted(
        processed: usize,
        total: usize,
        message: String,
        failures: Vec<BatchFailure>,
    ) -> Self {
        Self {
            state: JobState::Aborted,
            processed,
            total,
            message,
            failures,
            output: None,
        }
    }
}

/// A single print or save run over a template.
pub struct BatchJob {
    template: Template,
    bindings: Vec<PlaceholderBinding>,
    table: Option<Arc<dyn DataTable + Send + Sync>>,
    sink: Sink,
    options: BatchOptions,
    cancel: CancelToken,
    state: JobState,
}

impl BatchJob {
    /// A job rendering `template` with `bindings` into `sink`, with no table.
    pub fn new(template: Template, bindings: Vec<PlaceholderBinding>, sink: Sink) -> Self {
        Self {
            template,
            bindings,
            table: None,
            sink,
            options: BatchOptions::default(),
            cancel: CancelToken::new(),
            state: JobState::Idle,
        }
    }

    /// Attach the data table.
    pub fn with_table(mut self, table: Arc<dyn DataTable + Send + Sync>) -> Self {
        self.table = Some(table);
        self
    }

    /// Replace the default options.
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// A token that stops the job before its next row.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Single-label or per-row mode, per the rule in the module docs.
    pub fn mode(&self) -> BatchMode {
        match &self.table {
            Some(table) if self.bindings.iter().any(PlaceholderBinding::is_column) => {
                BatchMode::Rows {
                    rows: table.row_count(),
                }
            }
            _ => BatchMode::Single,
        }
    }

    /// Run the batch on the current thread.
    ///
    /// A job runs once; calling `run` again returns an aborted result
    /// without touching the sink.
    pub fn run(&mut self, observer: &mut dyn ProgressObserver) -> BatchResult {
        let result = if self.state == JobState::Idle {
            self.state = JobState::Running;
            self.execute(observer)
        } else {
            BatchResult::aborted(0, 0, "Error: batch has already run.".to_string(), Vec::new())
        };
        self.state = result.state;
        observer.on_finished(&result);
        result
    }

    /// Run the batch on a background thread.
    pub fn spawn(self) -> std::io::Result<BatchHandle> {
        handle::spawn(self)
    }

    fn execute(&mut self, observer: &mut dyn ProgressObserver) -> BatchResult {
        let mode = self.mode();
        let total = mode.total();
        let phase = self.sink.phase();
        let table = self.table.clone();
        let row_table: Option<&dyn DataTable> = match mode {
            BatchMode::Rows { .. } => table.as_deref().map(|t| t as &dyn DataTable),
            BatchMode::Single => None,
        };

        info!(?mode, total, %phase, "starting batch");
        observer.on_started(total, phase);

        let mut failures = Vec::new();
        let mut buffer = String::new();
        let mut processed = 0;

        for index in 0..total {
            if self.cancel.is_cancelled() {
                info!(processed, total, "batch cancelled");
                return BatchResult::aborted(processed, total, "Cancelled".to_string(), failures);
            }

            let row = row_table.map(|t| RowRef::new(t, index));
            let label = render(&self.template, &self.bindings, row);
            debug!(row = index, bytes = label.len(), "rendered label");

            let sent = match &mut self.sink {
                Sink::Print { printer, target } => printer.send(&label, &target.destination),
                Sink::Save { .. } => {
                    buffer.push_str(&label);
                    buffer.push('\n');
                    Ok(())
                }
            };

            match sent {
                Ok(()) => processed += 1,
                Err(err) => {
                    warn!(row = index, error = %err, "label rejected by sink");
                    failures.push(BatchFailure::Row {
                        row: index,
                        message: err.to_string(),
                    });
                    if self.options.error_policy == ErrorPolicy::FailFast {
                        let message =
                            format!("Error: label {} of {} failed: {}", index + 1, total, err);
                        return BatchResult::aborted(processed, total, message, failures);
                    }
                }
            }

            observer.on_progress(Progress {
                current: index + 1,
                total,
                phase,
            });

            if matches!(self.sink, Sink::Print { .. })
                && index + 1 < total
                && !self.options.throttle.is_zero()
            {
                thread::sleep(self.options.throttle);
            }
        }

        // An empty table still reports a finished bar.
        if total == 0 {
            observer.on_progress(Progress {
                current: 0,
                total: 0,
                phase,
            });
        }

        let (mut message, output) = match &mut self.sink {
            Sink::Print { .. } => ("Printing Completed!".to_string(), None),
            Sink::Save { writer, target } => {
                let path = target.path();
                if let Err(err) = writer.write_all(&buffer, &path) {
                    warn!(path = %path.display(), error = %err, "batch file write failed");
                    let message = format!("Error: could not write {}: {}", path.display(), err);
                    failures.push(BatchFailure::Io {
                        path,
                        message: err.to_string(),
                    });
                    return BatchResult::aborted(processed, total, message, failures);
                }
                (format!("Saved to {}", path.display()), Some(path))
            }
        };

        let state = if failures.is_empty() {
            JobState::Completed
        } else {
            message.push_str(&format!(" ({} of {} labels failed)", failures.len(), total));
            JobState::CompletedWithErrors
        };
        info!(?state, processed, total, "batch finished");

        BatchResult {
            state,
            processed,
            total,
            message,
            failures,
            output,
        }
    }
}

impl std::fmt::Debug for BatchJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchJob")
            .field("placeholders", &self.template.placeholders())
            .field("bindings", &self.bindings)
            .field("has_table", &self.table.is_some())
            .field("sink", &self.sink)
            .field("state", &self.state)
            .finish()
    }
}
