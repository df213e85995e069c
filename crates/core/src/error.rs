//! Typed error types for template import, mapping edits, and sinks.

use std::io;
use std::path::PathBuf;

/// Reasons a template cannot be accepted at the import boundary.
///
/// Import errors are resolved before a batch is created; the orchestrator
/// never sees them.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The template file does not exist.
    #[error("template not found: {}", .path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The template file exists but could not be read.
    #[error("could not read template: {}", .path.display())]
    Read {
        /// The path that was read.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// The text has no `^XA` start marker.
    #[error("template does not contain the ^XA start marker")]
    InvalidTemplate,

    /// The text is a label program but has no `[PLACEHOLDER]` tokens.
    #[error("template contains no editable placeholders")]
    NoEditablePlaceholders,
}

impl ImportError {
    /// One-line message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ImportError::NotFound { .. } => "Error: File does not exist.".to_string(),
            ImportError::Read { source, .. } => {
                format!("Error: Could not read file. {source}")
            }
            ImportError::InvalidTemplate => {
                "Error: Invalid ZPL file. Content must contain '^XA' command.".to_string()
            }
            ImportError::NoEditablePlaceholders => "Error: ZPL file must contain at least one \
                 editable placeholder in the format [PLACEHOLDER]."
                .to_string(),
        }
    }
}

/// Errors from editing a [`MappingSet`](crate::MappingSet).
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    /// The token is not one of the template's placeholders.
    #[error("unknown placeholder: {0}")]
    UnknownPlaceholder(String),

    /// A binding source string could not be parsed.
    #[error("invalid binding source '{0}' (expected col:NAME, const:VALUE, or empty)")]
    InvalidSource(String),
}

/// An opaque failure reported by a print or file sink.
///
/// Sinks are external collaborators, so only the message is kept.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SinkError(String);

impl SinkError {
    /// Create a sink error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The human-readable failure message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<io::Error> for SinkError {
    fn from(err: io::Error) -> Self {
        Self(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_are_distinct_per_import_failure() {
        let invalid = ImportError::InvalidTemplate.user_message();
        let empty = ImportError::NoEditablePlaceholders.user_message();
        let missing = ImportError::NotFound {
            path: PathBuf::from("label.zpl"),
        }
        .user_message();

        assert!(invalid.contains("^XA"));
        assert!(empty.contains("[PLACEHOLDER]"));
        assert_eq!(missing, "Error: File does not exist.");
        assert_ne!(invalid, empty);
    }

    #[test]
    fn read_error_keeps_os_message_as_suffix() {
        let err = ImportError::Read {
            path: PathBuf::from("label.zpl"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert_eq!(
            err.user_message(),
            "Error: Could not read file. access denied"
        );
    }

    #[test]
    fn sink_error_from_io() {
        let err = SinkError::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        assert_eq!(err.message(), "pipe closed");
        assert_eq!(err.to_string(), "pipe closed");
    }
}
