//! Placeholder bindings.
//!
//! Every placeholder discovered in a template gets exactly one
//! [`PlaceholderBinding`]. The binding kind is a tagged enum, so switching
//! from a column to a constant drops the column name instead of leaving a
//! stale field behind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::template::Template;

/// What replaces a placeholder when a label is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BindingKind {
    /// Take the value of the named table column for each row.
    Column(String),
    /// Use the same fixed text for every label.
    Constant(String),
    /// Replace with nothing.
    #[default]
    Empty,
}

impl FromStr for BindingKind {
    type Err = MappingError;

    /// Parse `col:NAME`, `column:NAME`, `const:VALUE`, `constant:VALUE`,
    /// or `empty`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("empty") {
            return Ok(BindingKind::Empty);
        }
        let Some((prefix, rest)) = s.split_once(':') else {
            return Err(MappingError::InvalidSource(s.to_string()));
        };
        match prefix.to_ascii_lowercase().as_str() {
            "col" | "column" if !rest.is_empty() => Ok(BindingKind::Column(rest.to_string())),
            "const" | "constant" => Ok(BindingKind::Constant(rest.to_string())),
            _ => Err(MappingError::InvalidSource(s.to_string())),
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::Column(name) => write!(f, "col:{name}"),
            BindingKind::Constant(value) => write!(f, "const:{value}"),
            BindingKind::Empty => write!(f, "empty"),
        }
    }
}

/// The binding for one placeholder token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderBinding {
    token: String,
    kind: BindingKind,
}

impl PlaceholderBinding {
    /// A new binding for `token`, initially [`BindingKind::Empty`].
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            kind: BindingKind::Empty,
        }
    }

    /// A new binding for `token` with the given kind.
    pub fn with_kind(token: impl Into<String>, kind: BindingKind) -> Self {
        Self {
            token: token.into(),
            kind,
        }
    }

    /// The bracketed placeholder token, e.g. `[Name]`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The active binding kind.
    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    /// Replace the binding kind.
    pub fn set_kind(&mut self, kind: BindingKind) {
        self.kind = kind;
    }

    /// `true` for column references.
    pub fn is_column(&self) -> bool {
        matches!(self.kind, BindingKind::Column(_))
    }

    /// `true` for constants.
    pub fn is_constant(&self) -> bool {
        matches!(self.kind, BindingKind::Constant(_))
    }

    /// The referenced column, if this is a column binding.
    pub fn column(&self) -> Option<&str> {
        match &self.kind {
            BindingKind::Column(name) => Some(name),
            _ => None,
        }
    }

    /// The fixed value, if this is a constant binding.
    pub fn constant(&self) -> Option<&str> {
        match &self.kind {
            BindingKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The token with its brackets removed, used for matching column names.
    pub fn bare_name(&self) -> String {
        self.token.replace(['[', ']'], "")
    }
}

/// A selectable source for a binding, in the order a picker lists them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SourceOption {
    /// A table column.
    Column(String),
    /// A fixed value entered by the user.
    Constant,
    /// Leave the field blank.
    Empty,
}

impl fmt::Display for SourceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOption::Column(name) => f.write_str(name),
            SourceOption::Constant => f.write_str("<Constant Value>"),
            SourceOption::Empty => f.write_str("<Empty>"),
        }
    }
}

/// Bindings for every placeholder of one template, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MappingSet {
    bindings: Vec<PlaceholderBinding>,
}

impl MappingSet {
    /// One [`BindingKind::Empty`] binding per placeholder of `template`.
    pub fn from_template(template: &Template) -> Self {
        Self {
            bindings: template
                .placeholders()
                .iter()
                .map(PlaceholderBinding::new)
                .collect(),
        }
    }

    /// Wrap an existing list of bindings.
    pub fn from_bindings(bindings: Vec<PlaceholderBinding>) -> Self {
        Self { bindings }
    }

    /// The bindings in order.
    pub fn bindings(&self) -> &[PlaceholderBinding] {
        &self.bindings
    }

    /// Consume the set and return the bindings.
    pub fn into_bindings(self) -> Vec<PlaceholderBinding> {
        self.bindings
    }

    /// The binding for `token`.
    pub fn get(&self, token: &str) -> Option<&PlaceholderBinding> {
        self.bindings.iter().find(|b| b.token == token)
    }

    /// Rebind `token`. Fails if the template has no such placeholder.
    pub fn set(&mut self, token: &str, kind: BindingKind) -> Result<(), MappingError> {
        let binding = self
            .bindings
            .iter_mut()
            .find(|b| b.token == token)
            .ok_or_else(|| MappingError::UnknownPlaceholder(token.to_string()))?;
        binding.set_kind(kind);
        Ok(())
    }

    /// Bind each placeholder whose bare name equals a column name to that
    /// column. Returns how many bindings were changed.
    pub fn auto_match(&mut self, columns: &[String]) -> usize {
        let mut changed = 0;
        for binding in &mut self.bindings {
            let name = binding.bare_name();
            if columns.iter().any(|c| *c == name) {
                let kind = BindingKind::Column(name);
                if binding.kind != kind {
                    binding.kind = kind;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// `true` if any placeholder reads from table data.
    pub fn uses_columns(&self) -> bool {
        self.bindings.iter().any(PlaceholderBinding::is_column)
    }

    /// Every source a binding can choose from: the columns, then constant,
    /// then empty.
    pub fn source_options(columns: &[String]) -> Vec<SourceOption> {
        columns
            .iter()
            .cloned()
            .map(SourceOption::Column)
            .chain([SourceOption::Constant, SourceOption::Empty])
            .collect()
    }
}
