//! ZPL label templates with bracketed placeholders.
//!
//! A template is the raw label program text, kept verbatim. Editable fields
//! are marked with square brackets, e.g. `^FD[Name]^FS`. A token is the
//! shortest run between a `[` and the next `]` on the same line, brackets
//! included, so `[A][B]` yields two tokens and `[[A]` yields one.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ImportError;
use crate::merge::{Substitutions, merge_text};

/// The control sequence every label program must contain (compared
/// ASCII case-insensitively).
pub const START_MARKER: &str = "^XA";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("placeholder pattern is a valid regex"));

/// An immutable label template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    placeholders: Vec<String>,
}

/// One placeholder occurrence inside the template text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence<'a> {
    /// The bracketed token, e.g. `[Name]`.
    pub token: &'a str,
    /// Byte range of the token in the template text.
    pub span: Range<usize>,
}

impl Template {
    /// Wrap raw text without validating it.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let placeholders = extract_placeholders(&text);
        Self { text, placeholders }
    }

    /// Accept raw text as a usable template.
    ///
    /// Validation runs here even if the caller already checked the text:
    /// the start marker must be present, then at least one placeholder.
    pub fn import(text: impl Into<String>) -> Result<Self, ImportError> {
        let template = Self::from_text(text);
        if !template.is_valid() {
            return Err(ImportError::InvalidTemplate);
        }
        if template.placeholders.is_empty() {
            return Err(ImportError::NoEditablePlaceholders);
        }
        Ok(template)
    }

    /// The raw template text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Distinct placeholder tokens in first-occurrence order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Every placeholder occurrence, duplicates included, in text order.
    pub fn occurrences(&self) -> impl Iterator<Item = Occurrence<'_>> + '_ {
        PLACEHOLDER.find_iter(&self.text).map(|m| Occurrence {
            token: m.as_str(),
            span: m.range(),
        })
    }

    /// `true` if the text contains the `^XA` start marker in any case.
    pub fn is_valid(&self) -> bool {
        has_start_marker(&self.text)
    }

    /// `true` if the template is valid and has at least one placeholder.
    pub fn is_valid_with_placeholders(&self) -> bool {
        self.is_valid() && !self.placeholders.is_empty()
    }

    /// Substitute `values` into the template. See [`merge_text`].
    pub fn merge(&self, values: &Substitutions) -> String {
        merge_text(&self.text, values)
    }
}

/// Read a template file and accept it through [`Template::import`].
pub fn load_template(path: impl AsRef<Path>) -> Result<Template, ImportError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ImportError::NotFound {
            path: path.to_path_buf(),
        },
        _ => ImportError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;
    Template::import(text)
}

/// Distinct bracketed tokens in first-occurrence order.
pub(crate) fn extract_placeholders(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    PLACEHOLDER
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| seen.insert(*token))
        .map(str::to_owned)
        .collect()
}

fn has_start_marker(text: &str) -> bool {
    text.as_bytes()
        .windows(START_MARKER.len())
        .any(|w| w.eq_ignore_ascii_case(START_MARKER.as_bytes()))
}
