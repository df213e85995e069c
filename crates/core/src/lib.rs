//! ZPL merge core library.
//!
//! Turns a ZPL label template with bracketed placeholders (`[Name]`) plus an
//! optional table of rows into a batch of rendered labels. The main entry
//! points are [`Template::import`] for accepting template text,
//! [`MappingSet`] for binding placeholders to data, [`render`] for a single
//! label, and [`BatchJob`] for a whole print or save run.

#![warn(missing_docs)]

/// Batch orchestration: mode selection, row loop, progress, and sinks.
pub mod batch;
/// Placeholder bindings and the per-template mapping set.
pub mod binding;
/// Batch tuning options.
pub mod config;
/// Typed errors for import, mapping, and sink failures.
pub mod error;
/// Substitution tables and the single-pass merge.
pub mod merge;
/// Per-row binding resolution.
pub mod resolve;
/// Read-only tabular data consumed by the resolver.
pub mod table;
/// Template text, validity rules, and placeholder discovery.
pub mod template;
/// Screen router for the interactive workflow.
pub mod wizard;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Template
pub use template::{Occurrence, START_MARKER, Template, load_template};

// Bindings
pub use binding::{BindingKind, MappingSet, PlaceholderBinding, SourceOption};

// Resolution and merge
pub use merge::{Substitutions, merge_text, render};
pub use resolve::resolve;

// Tables
pub use table::{DataTable, MemoryTable, RowRef};

// Batch
pub use batch::{
    AtomicFileWriter, BatchEvent, BatchFailure, BatchHandle, BatchJob, BatchMode, BatchResult,
    BatchWriter, CancelToken, ChannelObserver, JobState, LabelPrinter, OutputFormat, Phase,
    PrintTarget, Progress, ProgressObserver, SaveTarget, Sink,
};
pub use config::{BatchOptions, ErrorPolicy};

// Errors
pub use error::{ImportError, MappingError, SinkError};

// Router
pub use wizard::{Screen, WizardEvent, transition};
