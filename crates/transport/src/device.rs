//! Raw writes to a local device node or spool file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Transport, TransportError};

/// Writes labels straight to a path such as `/dev/usb/lp0`.
///
/// The file is opened for appending, so pointing it at a regular file
/// collects every label sent during the run.
#[derive(Debug)]
pub struct DeviceTransport {
    file: File,
    path: PathBuf,
}

impl DeviceTransport {
    /// Open `path` for appending, creating it if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref().to_path_buf();
        let file = Self::open_file(&path)?;
        debug!(path = %path.display(), "opened printer device");
        Ok(Self { file, path })
    }

    /// The device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(path: &Path) -> Result<File, TransportError> {
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| TransportError::DeviceOpen {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Transport for DeviceTransport {
    fn send_raw(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.file
            .write_all(data)
            .and_then(|()| self.file.flush())
            .map_err(TransportError::from_write)
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.file = Self::open_file(&self.path)?;
        Ok(())
    }
}
