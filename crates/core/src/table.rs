//! Read-only tabular data.
//!
//! Decoding spreadsheets or CSV files happens elsewhere; the merge pipeline
//! only needs column names, a row count, and cell lookup by column name.

/// A decoded table of named columns and ordered rows.
pub trait DataTable {
    /// Column names in header order.
    fn column_names(&self) -> &[String];

    /// Number of data rows (the header is not a row).
    fn row_count(&self) -> usize;

    /// The text of the cell at `row` in `column`, if present.
    fn value_at(&self, row: usize, column: &str) -> Option<&str>;

    /// `true` if the table has a column called `column`.
    fn has_column(&self, column: &str) -> bool {
        self.column_names().iter().any(|c| c == column)
    }
}

/// A borrowed view of one table row.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a dyn DataTable,
    index: usize,
}

impl<'a> RowRef<'a> {
    /// View row `index` of `table`.
    pub fn new(table: &'a dyn DataTable, index: usize) -> Self {
        Self { table, index }
    }

    /// The row's position in the table (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// The cell for `column`, or `None` if the table has no such column or
    /// the cell is missing.
    pub fn value(&self, column: &str) -> Option<&'a str> {
        if !self.table.has_column(column) {
            return None;
        }
        self.table.value_at(self.index, column)
    }
}

impl std::fmt::Debug for RowRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowRef").field("index", &self.index).finish()
    }
}

/// An in-memory table.
///
/// Rows shorter than the header have missing trailing cells; longer rows are
/// truncated. When a header repeats a name, lookups use the first column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl MemoryTable {
    /// An empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row of cells in column order.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        self.rows.push(row);
    }

    /// Builder form of [`push_row`](Self::push_row).
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

impl DataTable for MemoryTable {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value_at(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}
