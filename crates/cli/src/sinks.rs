//! Adapters from the transport and stdout to the batch sink traits.

use std::io::{self, Write};
use std::path::Path;

use zpl_merge_core::{BatchWriter, LabelPrinter, SinkError};
use zpl_merge_transport::Transport;

/// Sends labels over a connected [`Transport`].
///
/// The transport is already bound to one printer, so the destination name is
/// only used for logging.
pub(crate) struct TransportPrinter<T>(pub(crate) T);

impl<T: Transport> LabelPrinter for TransportPrinter<T> {
    fn send(&mut self, label: &str, destination: &str) -> Result<(), SinkError> {
        tracing::trace!(destination, bytes = label.len(), "sending label");
        self.0.send_label(label).map_err(|e| SinkError::new(error_chain(&e)))
    }
}

/// Writes the finished batch to stdout instead of a file.
pub(crate) struct StdoutWriter;

impl BatchWriter for StdoutWriter {
    fn write_all(&mut self, contents: &str, _path: &Path) -> Result<(), SinkError> {
        let mut out = io::stdout().lock();
        out.write_all(contents.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// `outer: inner: root`, the way anyhow's `{:#}` prints.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
