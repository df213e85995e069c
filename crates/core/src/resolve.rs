//! Per-row binding resolution.

use crate::binding::{BindingKind, PlaceholderBinding};
use crate::merge::Substitutions;
use crate::table::RowRef;

/// Build the substitution table for one label.
///
/// Produces one entry per binding, keyed by its token, in binding order.
/// Column bindings read from `row`; with no row, or a column the table does
/// not have, they resolve to empty text instead of failing.
pub fn resolve(bindings: &[PlaceholderBinding], row: Option<RowRef<'_>>) -> Substitutions {
    let mut values = Substitutions::new();
    for binding in bindings {
        let value = match binding.kind() {
            BindingKind::Constant(value) => value.as_str(),
            BindingKind::Empty => "",
            BindingKind::Column(column) => row.and_then(|r| r.value(column)).unwrap_or_default(),
        };
        values.insert(binding.token(), value);
    }
    values
}
