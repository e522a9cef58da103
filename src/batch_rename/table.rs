//! Reading the key → target name table from CSV or spreadsheet files.

use std::fs;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use crate::batch_rename::RenameError;

/// Largest accepted mapping file size in bytes.
pub const MAX_TABLE_SIZE: u64 = 10 * 1024 * 1024;

/// Number of data rows read when only the column names are needed.
const COLUMN_PREVIEW_ROWS: usize = 5;

/// File extensions that are read as spreadsheets instead of delimited text.
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Tabular data with a header row. All cells are strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Resolve a column name to its index.
    ///
    /// # Errors
    /// Returns `MissingColumn` listing the available columns if no header matches.
    pub fn column_index(&self, name: &str) -> Result<usize, RenameError> {
        self.headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| RenameError::MissingColumn {
                column: name.to_string(),
                available: self.headers.clone(),
            })
    }

    /// Get the cell values of the two given columns for every row.
    /// Missing cells in short rows are returned as empty strings.
    pub fn pairs(&self, key_index: usize, target_index: usize) -> impl Iterator<Item = (&str, &str)> {
        self.rows.iter().map(move |row| {
            let cell = |index: usize| row.get(index).map_or("", String::as_str);
            (cell(key_index), cell(target_index))
        })
    }
}

/// Read the column names of a mapping file without loading all rows.
///
/// # Errors
/// Returns an error if the file is too large or cannot be parsed.
pub fn read_columns(path: &Path) -> Result<Vec<String>, RenameError> {
    check_size(path)?;
    Ok(read(path, Some(COLUMN_PREVIEW_ROWS))?.headers)
}

/// Read the full mapping table.
///
/// # Errors
/// Returns an error if the file is too large or cannot be parsed.
pub fn read_table(path: &Path) -> Result<Table, RenameError> {
    check_size(path)?;
    read(path, None)
}

/// Check the file size limit before parsing anything.
fn check_size(path: &Path) -> Result<(), RenameError> {
    let size = fs::metadata(path).map_err(|e| RenameError::io(path, e))?.len();
    if size > MAX_TABLE_SIZE {
        return Err(RenameError::TableTooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_TABLE_SIZE,
        });
    }
    Ok(())
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SPREADSHEET_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}

fn read(path: &Path, max_rows: Option<usize>) -> Result<Table, RenameError> {
    if is_spreadsheet(path) {
        read_spreadsheet(path, max_rows)
    } else {
        read_csv(path, max_rows)
    }
}

fn read_csv(path: &Path, max_rows: Option<usize>) -> Result<Table, RenameError> {
    let bytes = fs::read(path).map_err(|e| RenameError::io(path, e))?;
    // Strips a UTF-8 byte order mark so the first header is not polluted
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        return Err(RenameError::table(path, "file is not valid UTF-8"));
    }
    parse_csv(&text, max_rows).map_err(|e| RenameError::table(path, e))
}

fn parse_csv(text: &str, max_rows: Option<usize>) -> Result<Table, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        if max_rows.is_some_and(|max| rows.len() >= max) {
            break;
        }
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

fn read_spreadsheet(path: &Path, max_rows: Option<usize>) -> Result<Table, RenameError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| RenameError::table(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RenameError::table(path, "workbook has no worksheets"))?
        .map_err(|e| RenameError::table(path, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| cell_to_string(cell).trim().to_string()).collect())
        .unwrap_or_default();

    let rows: Vec<Vec<String>> = rows
        .take(max_rows.unwrap_or(usize::MAX))
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(Table { headers, rows })
}

/// Convert a spreadsheet cell to text.
/// Whole numbers stored as floats are printed without the fractional part.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Int(value) => value.to_string(),
        #[allow(clippy::cast_possible_truncation)]
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => (*value as i64).to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod table_tests {
    use super::*;

    use std::fs::File;
    use std::io::Write;

    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(ToString::to_string).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }

    #[test]
    fn column_index_finds_header() {
        let table = table(&["Name", "File"], &[]);
        assert_eq!(table.column_index("File").unwrap(), 1);
    }

    #[test]
    fn column_index_missing_lists_available() {
        let table = table(&["Name", "File"], &[]);
        match table.column_index("Key") {
            Err(RenameError::MissingColumn { column, available }) => {
                assert_eq!(column, "Key");
                assert_eq!(available, vec!["Name", "File"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn pairs_fill_short_rows() {
        let table = table(&["Name", "File"], &[&["Anna", "a.pdf"], &["Bob"]]);
        let pairs: Vec<_> = table.pairs(0, 1).collect();
        assert_eq!(pairs, vec![("Anna", "a.pdf"), ("Bob", "")]);
    }

    #[test]
    fn parse_csv_reads_headers_and_rows() {
        let table = parse_csv("Name,File\nAnna,Anna.pdf\nBob,\"Bob, Jr.pdf\"\n", None).unwrap();
        assert_eq!(table.headers, vec!["Name", "File"]);
        assert_eq!(table.rows[1], vec!["Bob", "Bob, Jr.pdf"]);
    }

    #[test]
    fn parse_csv_limits_rows() {
        let text = "Name,File\n1,a\n2,b\n3,c\n";
        let table = parse_csv(text, Some(2)).unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn read_csv_strips_byte_order_mark() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"\xEF\xBB\xBFName,File\nAnna,Anna.pdf\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Name", "File"]);
        assert_eq!(table.column_index("Name").unwrap(), 0);
    }

    #[test]
    fn read_columns_lists_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        fs::write(&path, "Key,Target,Notes\na,b,c\n").unwrap();
        assert_eq!(read_columns(&path).unwrap(), vec!["Key", "Target", "Notes"]);
    }

    #[test]
    fn oversized_file_is_rejected_before_parsing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.csv");
        let file = File::create(&path).unwrap();
        file.set_len(MAX_TABLE_SIZE + 1).unwrap();

        assert!(matches!(read_table(&path), Err(RenameError::TableTooLarge { .. })));
        assert!(matches!(read_columns(&path), Err(RenameError::TableTooLarge { .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = read_table(&dir.path().join("nope.csv"));
        assert!(matches!(result, Err(RenameError::Io { .. })));
    }

    #[test]
    fn read_xlsx_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mapping.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "File").unwrap();
        sheet.write_string(1, 0, "Anna").unwrap();
        sheet.write_string(1, 1, "Anna CV.pdf").unwrap();
        sheet.write_number(2, 0, 1001).unwrap();
        sheet.write_string(2, 1, "Employee 1001").unwrap();
        workbook.save(&path).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, vec!["Name", "File"]);
        assert_eq!(table.rows[0], vec!["Anna", "Anna CV.pdf"]);
        assert_eq!(table.rows[1], vec!["1001", "Employee 1001"]);
    }

    #[test]
    fn cell_to_string_formats_numbers() {
        assert_eq!(cell_to_string(&Data::Float(42.0)), "42");
        assert_eq!(cell_to_string(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
