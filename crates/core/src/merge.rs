//! Substitution tables and the single-pass merge.

use serde::Serialize;

use crate::binding::PlaceholderBinding;
use crate::resolve::resolve;
use crate::table::RowRef;
use crate::template::Template;

/// Placeholder token → replacement text, in binding order.
///
/// Inserting an existing token overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Substitutions {
    entries: Vec<(String, String)>,
}

impl Substitutions {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for `token`.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Look up the value for `token`.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == token)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Substitutions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut subs = Substitutions::new();
        for (k, v) in iter {
            subs.insert(k, v);
        }
        subs
    }
}

/// Replace every occurrence of each token in `values` within `text`.
///
/// The scan walks the original text once, left to right. Replacement text is
/// copied to the output and never scanned again, so a value that happens to
/// contain another token's brackets stays literal. When two tokens match at
/// the same position the longer one wins. Blank text or an empty table
/// returns `text` unchanged.
pub fn merge_text(text: &str, values: &Substitutions) -> String {
    if text.trim().is_empty() || values.is_empty() {
        return text.to_owned();
    }

    let mut keys: Vec<(&str, &str)> = values
        .iter()
        .filter(|(k, _)| !k.is_empty() && text.contains(*k))
        .collect();
    if keys.is_empty() {
        return text.to_owned();
    }
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    while pos < text.len() {
        let tail = &text[pos..];
        match keys.iter().find(|(k, _)| tail.starts_with(*k)) {
            Some((key, value)) => {
                out.push_str(&text[copied..pos]);
                out.push_str(value);
                pos += key.len();
                copied = pos;
            }
            None => pos += tail.chars().next().map_or(1, char::len_utf8),
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Render one label: resolve `bindings` against `row`, then merge.
///
/// A missing row or column degrades to empty text; rendering never fails.
pub fn render(
    template: &Template,
    bindings: &[PlaceholderBinding],
    row: Option<RowRef<'_>>,
) -> String {
    template.merge(&resolve(bindings, row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> Substitutions {
        pairs.iter().copied().collect()
    }

    #[test]
    fn replaces_all_occurrences() {
        let out = merge_text("^XA[A]-[A]-[B]^XZ", &subs(&[("[A]", "1"), ("[B]", "2")]));
        assert_eq!(out, "^XA1-1-2^XZ");
    }

    #[test]
    fn replacement_is_not_rescanned() {
        let out = merge_text("^XA[A][B]^XZ", &subs(&[("[A]", "[B]"), ("[B]", "x")]));
        assert_eq!(out, "^XA[B]x^XZ");
    }

    #[test]
    fn order_of_entries_does_not_matter() {
        let a = merge_text("[A][B]", &subs(&[("[B]", "[A]"), ("[A]", "b")]));
        let b = merge_text("[A][B]", &subs(&[("[A]", "b"), ("[B]", "[A]")]));
        assert_eq!(a, "b[A]");
        assert_eq!(a, b);
    }

    #[test]
    fn longest_token_wins_at_same_position() {
        let out = merge_text("^XA[[A]^XZ", &subs(&[("[A]", "short"), ("[[A]", "long")]));
        assert_eq!(out, "^XAlong^XZ");
    }

    #[test]
    fn keys_absent_from_template_are_ignored() {
        let out = merge_text("^XA[A]^XZ", &subs(&[("[Z]", "nope")]));
        assert_eq!(out, "^XA[A]^XZ");
    }

    #[test]
    fn blank_template_or_empty_table_returns_input() {
        assert_eq!(merge_text("", &subs(&[("[A]", "1")])), "");
        assert_eq!(merge_text("   ", &subs(&[("[A]", "1")])), "   ");
        assert_eq!(merge_text("^XA[A]^XZ", &Substitutions::new()), "^XA[A]^XZ");
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let out = merge_text("^XA^FDÜber [Name] ✓^FS^XZ", &subs(&[("[Name]", "Zoë")]));
        assert_eq!(out, "^XA^FDÜber Zoë ✓^FS^XZ");
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut s = Substitutions::new();
        s.insert("[A]", "1");
        s.insert("[B]", "2");
        s.insert("[A]", "3");
        let entries: Vec<_> = s.iter().collect();
        assert_eq!(entries, [("[A]", "3"), ("[B]", "2")]);
        assert_eq!(s.get("[A]"), Some("3"));
        assert_eq!(s.get("[C]"), None);
    }
}
