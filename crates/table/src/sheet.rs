//! Spreadsheet decoding (xlsx, xlsm, xlsb, xls, ods).

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use tracing::debug;
use zpl_merge_core::MemoryTable;

use crate::TableError;

/// File extensions decoded as workbooks rather than delimited text.
pub const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Whether `path` names a workbook, judged by its extension.
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Decode the first worksheet of the workbook at `path`.
///
/// The first row is the header; a blank header cell is named
/// `Column{n}` (1-based). Rows whose cells are all blank are skipped, and
/// cell text is trimmed.
pub fn read_sheet(path: impl AsRef<Path>) -> Result<MemoryTable, TableError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| TableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet_name = workbook.sheet_names().first().cloned();
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(TableError::NoWorksheet)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(TableError::MissingHeader);
    };
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell_text(cell) {
            name if name.is_empty() => format!("Column{}", i + 1),
            name => name,
        })
        .collect();

    let mut table = MemoryTable::new(columns.iter());
    let mut count = 0usize;
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(String::is_empty) {
            continue;
        }
        table.push_row(cells);
        count += 1;
    }

    debug!(
        path = %path.display(),
        sheet = sheet_name.as_deref().unwrap_or_default(),
        columns = columns.len(),
        rows = count,
        "decoded worksheet"
    );
    Ok(table)
}

/// Cell contents as label text. Whole numbers print without a fraction.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_extensions_are_case_insensitive() {
        assert!(is_spreadsheet(Path::new("data.xlsx")));
        assert!(is_spreadsheet(Path::new("DATA.XLS")));
        assert!(is_spreadsheet(Path::new("dir/sheet.ods")));
        assert!(!is_spreadsheet(Path::new("data.csv")));
        assert!(!is_spreadsheet(Path::new("xlsx")));
    }

    #[test]
    fn cell_text_formats_values() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("  Acme ".into())), "Acme");
        assert_eq!(cell_text(&Data::Float(12.0)), "12");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }
}
