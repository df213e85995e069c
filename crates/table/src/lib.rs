//! Table decoding for label data.
//!
//! Reads a delimited text file or the first worksheet of a workbook, each
//! with a header row, into a [`MemoryTable`](zpl_merge_core::MemoryTable),
//! the in-memory table the batch pipeline consumes. [`read_table`] picks the
//! decoder from the file extension. For CSV the delimiter can be fixed or
//! sniffed from the header line.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zpl_merge_core::MemoryTable;

mod sheet;

pub use sheet::{SPREADSHEET_EXTENSIONS, is_spreadsheet, read_sheet};

/// Delimiters tried when none is configured, in tie-break order.
pub const SNIFF_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Options for [`read_csv`].
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter. `None` sniffs one from the header line.
    pub delimiter: Option<u8>,
    /// Trim surrounding whitespace from headers and cells.
    pub trim: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            trim: true,
        }
    }
}

impl CsvOptions {
    /// Use a fixed delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// Errors from decoding a table.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The file could not be opened.
    #[error("could not open {}", .path.display())]
    Open {
        /// The path that was attempted.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading the input failed or it was not UTF-8.
    #[error("could not read table data")]
    Read(#[source] io::Error),

    /// The CSV structure could not be decoded.
    #[error("malformed CSV: {0}")]
    Parse(#[from] csv::Error),

    /// The workbook could not be decoded.
    #[error("malformed spreadsheet: {0}")]
    Sheet(#[from] calamine::Error),

    /// The workbook has no worksheets.
    #[error("workbook has no worksheets")]
    NoWorksheet,

    /// The input has no header row.
    #[error("table has no header row")]
    MissingHeader,
}

/// Decode `path` as a workbook or as CSV, chosen by its extension.
///
/// `options` applies to CSV input only.
pub fn read_table(
    path: impl AsRef<Path>,
    options: &CsvOptions,
) -> Result<MemoryTable, TableError> {
    let path = path.as_ref();
    if is_spreadsheet(path) {
        read_sheet(path)
    } else {
        read_csv(path, options)
    }
}

/// Decode the CSV file at `path`.
pub fn read_csv(path: impl AsRef<Path>, options: &CsvOptions) -> Result<MemoryTable, TableError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = read_csv_from(file, options)?;
    debug!(path = %path.display(), "decoded table");
    Ok(table)
}

/// Decode CSV from any reader.
///
/// The first record is the header. Rows with fewer cells than the header
/// leave the trailing columns missing; extra cells are dropped.
pub fn read_csv_from<R: Read>(
    mut reader: R,
    options: &CsvOptions,
) -> Result<MemoryTable, TableError> {
    let mut text = String::new();
    reader.read_to_string(&mut text).map_err(TableError::Read)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(text));

    let mut csv = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(if options.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(text.as_bytes());

    let headers = csv.headers()?.clone();
    if headers.is_empty() {
        return Err(TableError::MissingHeader);
    }

    let mut table = MemoryTable::new(headers.iter());
    let mut rows = 0usize;
    for record in csv.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        table.push_row(record.iter());
        rows += 1;
    }

    debug!(
        delimiter = %char::from(delimiter).escape_default(),
        columns = headers.len(),
        rows,
        "parsed CSV"
    );
    Ok(table)
}

/// Pick the candidate delimiter that appears most often in the first
/// non-blank line, ignoring quoted sections. Falls back to `,`.
pub fn sniff_delimiter(text: &str) -> u8 {
    let Some(header) = text.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut counts = [0usize; SNIFF_CANDIDATES.len()];
    let mut quoted = false;
    for b in header.bytes() {
        if b == b'"' {
            quoted = !quoted;
            continue;
        }
        if quoted {
            continue;
        }
        if let Some(i) = SNIFF_CANDIDATES.iter().position(|&c| c == b) {
            counts[i] += 1;
        }
    }

    // First maximum wins ties.
    let mut best = 0;
    for (i, &n) in counts.iter().enumerate() {
        if n > counts[best] {
            best = i;
        }
    }
    if counts[best] == 0 { b',' } else { SNIFF_CANDIDATES[best] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpl_merge_core::DataTable;

    fn parse(input: &str) -> MemoryTable {
        read_csv_from(input.as_bytes(), &CsvOptions::default()).unwrap()
    }

    #[test]
    fn sniffs_common_delimiters() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        assert_eq!(sniff_delimiter("a|b|c"), b'|');
    }

    #[test]
    fn sniff_ignores_quoted_delimiters() {
        assert_eq!(sniff_delimiter("\"a,b,c\";d"), b';');
    }

    #[test]
    fn sniff_defaults_to_comma() {
        assert_eq!(sniff_delimiter("single"), b',');
        assert_eq!(sniff_delimiter(""), b',');
        assert_eq!(sniff_delimiter("\n\n"), b',');
    }

    #[test]
    fn sniff_tie_prefers_earlier_candidate() {
        assert_eq!(sniff_delimiter("a,b;c"), b',');
    }

    #[test]
    fn decodes_header_and_rows() {
        let t = parse("Name,Price\nAcme,9.99\nGlobex,1.50\n");
        assert_eq!(t.column_names(), ["Name", "Price"]);
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.value_at(1, "Name"), Some("Globex"));
        assert_eq!(t.value_at(0, "Price"), Some("9.99"));
    }

    #[test]
    fn trims_cells_by_default() {
        let t = parse("Name , Price\n  Acme ,  9.99\n");
        assert_eq!(t.column_names(), ["Name", "Price"]);
        assert_eq!(t.value_at(0, "Name"), Some("Acme"));
    }

    #[test]
    fn keeps_whitespace_when_trim_disabled() {
        let opts = CsvOptions {
            trim: false,
            ..CsvOptions::default()
        };
        let t = read_csv_from("Name\n  Acme \n".as_bytes(), &opts).unwrap();
        assert_eq!(t.value_at(0, "Name"), Some("  Acme "));
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let t = parse("A,B,C\n1\n1,2,3,4\n");
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.value_at(0, "A"), Some("1"));
        assert_eq!(t.value_at(0, "B"), None);
        assert_eq!(t.value_at(1, "C"), Some("3"));
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_newlines() {
        let t = parse("Name,Address\n\"Acme, Inc.\",\"1 Main St\nSuite 2\"\n");
        assert_eq!(t.value_at(0, "Name"), Some("Acme, Inc."));
        assert_eq!(t.value_at(0, "Address"), Some("1 Main St\nSuite 2"));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let t = parse("Name\nAcme\n\n\nGlobex\n");
        assert_eq!(t.row_count(), 2);
    }

    #[test]
    fn fixed_delimiter_overrides_sniffing() {
        let opts = CsvOptions::default().with_delimiter(b';');
        let t = read_csv_from("A,B;C\n1,2;3\n".as_bytes(), &opts).unwrap();
        assert_eq!(t.column_names(), ["A,B", "C"]);
        assert_eq!(t.value_at(0, "A,B"), Some("1,2"));
    }

    #[test]
    fn empty_input_has_no_header() {
        let err = read_csv_from("".as_bytes(), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, TableError::MissingHeader));
    }

    #[test]
    fn header_only_gives_zero_rows() {
        let t = parse("Name,Price\n");
        assert_eq!(t.row_count(), 0);
        assert_eq!(t.column_names().len(), 2);
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let bytes: &[u8] = &[b'A', b'\n', 0xff, 0xfe, b'\n'];
        let err = read_csv_from(bytes, &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, TableError::Read(_)));
    }
}
