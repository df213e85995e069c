//! Shared test doubles for `zpl_merge_core` integration tests.

#![allow(unreachable_pub, dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use zpl_merge_core::{BatchWriter, LabelPrinter, SinkError};

/// Records every label it receives; fails on the configured call (0-based).
#[derive(Clone, Default)]
pub struct RecordingPrinter {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub attempts: Arc<Mutex<usize>>,
    pub fail_on: Option<usize>,
}

impl RecordingPrinter {
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl LabelPrinter for RecordingPrinter {
    fn send(&mut self, label: &str, destination: &str) -> Result<(), SinkError> {
        let mut attempts = self.attempts.lock().unwrap();
        let call = *attempts;
        *attempts += 1;
        if Some(call) == self.fail_on {
            return Err(SinkError::new("Printer error. Check connection."));
        }
        self.sent
            .lock()
            .unwrap()
            .push((label.to_string(), destination.to_string()));
        Ok(())
    }
}

/// Records every `write_all` call without touching the filesystem.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub writes: Arc<Mutex<Vec<(String, PathBuf)>>>,
    pub fail: bool,
}

impl RecordingWriter {
    pub fn writes(&self) -> Vec<(String, PathBuf)> {
        self.writes.lock().unwrap().clone()
    }
}

impl BatchWriter for RecordingWriter {
    fn write_all(&mut self, contents: &str, path: &Path) -> Result<(), SinkError> {
        if self.fail {
            return Err(SinkError::new("disk full"));
        }
        self.writes
            .lock()
            .unwrap()
            .push((contents.to_string(), path.to_path_buf()));
        Ok(())
    }
}
