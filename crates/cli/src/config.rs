//! Optional JSON settings file.
//!
//! Every field is optional. Values from the file replace built-in defaults;
//! command-line flags replace values from the file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use zpl_merge_core::OutputFormat;

/// Settings read from `--config FILE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    /// Printer address for `print`.
    pub(crate) printer: Option<String>,
    /// Device path for `print`.
    pub(crate) device: Option<PathBuf>,
    /// Milliseconds between printed labels.
    pub(crate) throttle_ms: Option<u64>,
    /// Send attempts per label, counting the first.
    pub(crate) retries: Option<u32>,
    /// Connect and write timeout in seconds.
    pub(crate) timeout_secs: Option<u64>,
    /// Keep going after a label fails.
    pub(crate) continue_on_error: Option<bool>,
    /// CSV delimiter; sniffed when absent.
    pub(crate) delimiter: Option<char>,
    /// Output directory for `save`.
    pub(crate) directory: Option<PathBuf>,
    /// Output file name without extension for `save`.
    pub(crate) base_name: Option<String>,
    /// Output format for `save`.
    pub(crate) format: Option<OutputFormat>,
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Error: could not read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Error: invalid config file {}", path.display()))
    }

    /// Load `path` if given, otherwise all defaults.
    pub(crate) fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
