//! Output sinks: where rendered labels go.
//!
//! Printing streams each label to a [`LabelPrinter`] as soon as it is
//! rendered. Saving buffers every label and hands the whole batch to a
//! [`BatchWriter`] once, after the last row.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Phase;
use crate::error::SinkError;

/// Sends one rendered label to a printer.
pub trait LabelPrinter: Send {
    /// Send `label` to the printer identified by `destination`.
    fn send(&mut self, label: &str, destination: &str) -> Result<(), SinkError>;
}

/// Writes a finished batch as a single artifact.
pub trait BatchWriter: Send {
    /// Write `contents` to `path`, replacing any existing file.
    fn write_all(&mut self, contents: &str, path: &Path) -> Result<(), SinkError>;
}

/// Writes via a temporary file in the destination directory, then renames
/// it into place, so a failed write leaves no partial file behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicFileWriter;

impl BatchWriter for AtomicFileWriter {
    fn write_all(&mut self, contents: &str, path: &Path) -> Result<(), SinkError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| SinkError::from(e.error))?;
        Ok(())
    }
}

/// Batch file formats. Only the extension differs; the content is ZPL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `.zpl`
    #[default]
    Zpl,
    /// `.txt`
    Txt,
    /// `.prn`
    Prn,
}

impl OutputFormat {
    /// Every format, in picker order.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Zpl, OutputFormat::Txt, OutputFormat::Prn];

    /// File extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Zpl => ".zpl",
            OutputFormat::Txt => ".txt",
            OutputFormat::Prn => ".prn",
        }
    }

    /// Human-readable name for pickers.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Zpl => "ZPL Code (.zpl)",
            OutputFormat::Txt => "Text File (.txt)",
            OutputFormat::Prn => "Print File (.prn)",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension()[1..])
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "zpl" => Ok(OutputFormat::Zpl),
            "txt" => Ok(OutputFormat::Txt),
            "prn" => Ok(OutputFormat::Prn),
            other => Err(format!("unknown output format '{other}' (expected zpl, txt, or prn)")),
        }
    }
}

/// Where a saved batch goes: `directory/base_name + extension`.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveTarget {
    /// Output directory.
    pub directory: PathBuf,
    /// File name without extension.
    pub base_name: String,
    /// Output format (selects the extension).
    pub format: OutputFormat,
}

impl SaveTarget {
    /// Default base name for a new batch file.
    pub const DEFAULT_BASE_NAME: &'static str = "Labels_Batch_01";

    /// A target in `directory` with the default name and format.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Set the base name.
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    /// Set the format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// The full output path.
    pub fn path(&self) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.base_name, self.format.extension()))
    }

    /// `true` once both a directory and a base name are filled in.
    pub fn is_ready(&self) -> bool {
        !self.directory.as_os_str().is_empty() && !self.base_name.trim().is_empty()
    }
}

impl Default for SaveTarget {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            base_name: Self::DEFAULT_BASE_NAME.to_string(),
            format: OutputFormat::Zpl,
        }
    }
}

/// Where printed labels go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrintTarget {
    /// Printer identifier passed to [`LabelPrinter::send`].
    pub destination: String,
}

impl PrintTarget {
    /// A target for the named printer.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// `true` once a printer has been chosen.
    pub fn is_ready(&self) -> bool {
        !self.destination.trim().is_empty()
    }
}

/// The output side of a batch.
pub enum Sink {
    /// Stream each label to a printer.
    Print {
        /// The printer transport.
        printer: Box<dyn LabelPrinter>,
        /// Printer selection.
        target: PrintTarget,
    },
    /// Collect labels and write one file at the end.
    Save {
        /// The file writer.
        writer: Box<dyn BatchWriter>,
        /// Output location.
        target: SaveTarget,
    },
}

impl Sink {
    /// A print sink.
    pub fn print(printer: impl LabelPrinter + 'static, target: PrintTarget) -> Self {
        Sink::Print {
            printer: Box::new(printer),
            target,
        }
    }

    /// A save sink.
    pub fn save(writer: impl BatchWriter + 'static, target: SaveTarget) -> Self {
        Sink::Save {
            writer: Box::new(writer),
            target,
        }
    }

    /// The progress phase this sink reports.
    pub fn phase(&self) -> Phase {
        match self {
            Sink::Print { .. } => Phase::Printing,
            Sink::Save { .. } => Phase::Generating,
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Print { target, .. } => f.debug_struct("Print").field("target", target).finish(),
            Sink::Save { target, .. } => f.debug_struct("Save").field("target", target).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_target_defaults() {
        let t = SaveTarget::new("/tmp/out");
        assert_eq!(t.base_name, "Labels_Batch_01");
        assert_eq!(t.format, OutputFormat::Zpl);
        assert_eq!(t.path(), PathBuf::from("/tmp/out/Labels_Batch_01.zpl"));
    }

    #[test]
    fn save_target_path_uses_format_extension() {
        let t = SaveTarget::new("out")
            .with_base_name("batch")
            .with_format(OutputFormat::Prn);
        assert_eq!(t.path(), Path::new("out").join("batch.prn"));
    }

    #[test]
    fn readiness_requires_fields() {
        assert!(!SaveTarget::default().is_ready());
        assert!(!SaveTarget::new("out").with_base_name("  ").is_ready());
        assert!(SaveTarget::new("out").is_ready());
        assert!(!PrintTarget::default().is_ready());
        assert!(PrintTarget::new("Zebra ZD420").is_ready());
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("zpl".parse::<OutputFormat>().unwrap(), OutputFormat::Zpl);
        assert_eq!(".TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
        assert_eq!("prn".parse::<OutputFormat>().unwrap(), OutputFormat::Prn);
        assert!("pdf".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Txt.to_string(), "txt");
        assert_eq!(OutputFormat::ALL[0].label(), "ZPL Code (.zpl)");
    }

    #[test]
    fn atomic_writer_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.zpl");
        std::fs::write(&path, "old").unwrap();
        AtomicFileWriter.write_all("new\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn atomic_writer_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("batch.zpl");
        assert!(AtomicFileWriter.write_all("x", &path).is_err());
        assert!(!path.exists());
    }
}
