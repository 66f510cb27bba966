use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use super::ImportError;

/// Accepted upload formats, decided from the declared filename before any
/// parsing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if ext.eq_ignore_ascii_case("xlsx") {
            Some(Self::Xlsx)
        } else {
            None
        }
    }
}

/// One data row: normalized header -> raw cell text, plus the 1-based file
/// row number used in error messages (row 1 is the header).
#[derive(Debug)]
pub struct RawRow {
    pub number: usize,
    cells: HashMap<String, String>,
}

impl RawRow {
    #[must_use]
    pub fn new(number: usize, cells: HashMap<String, String>) -> Self {
        Self { number, cells }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

/// Lowercases, trims, and collapses internal whitespace runs, so that
/// `"Business  Line "` and `"business line"` address the same column.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_rows(kind: FileKind, data: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    match kind {
        FileKind::Csv => parse_csv(data),
        FileKind::Xlsx => parse_xlsx(data),
    }
}

/// First record is the header; all-blank rows are dropped without consuming
/// a row error, but keep their place in the numbering.
fn build_rows(records: Vec<Vec<String>>) -> Vec<RawRow> {
    let mut iter = records.into_iter();
    let Some(header) = iter.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();

    let mut rows = Vec::new();
    for (i, record) in iter.enumerate() {
        let mut cells = HashMap::new();
        for (j, value) in record.into_iter().enumerate() {
            if let Some(h) = headers.get(j) {
                if !h.is_empty() {
                    cells.insert(h.clone(), value);
                }
            }
        }
        let row = RawRow::new(i + 2, cells);
        if !row.is_blank() {
            rows.push(row);
        }
    }
    rows
}

fn parse_csv(data: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::CorruptFile(e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(build_rows(records))
}

fn parse_xlsx(data: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let mut workbook =
        Xlsx::new(Cursor::new(data)).map_err(|e| ImportError::CorruptFile(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| ImportError::CorruptFile(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let records = range
        .rows()
        .map(|cells| cells.iter().map(cell_text).collect())
        .collect();
    Ok(build_rows(records))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Integral floats render without the trailing ".0" Excel stores,
        // so year/month cells parse as integers downstream
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_name() {
        assert_eq!(FileKind::from_name("budget.csv"), Some(FileKind::Csv));
        assert_eq!(FileKind::from_name("Q1 Plan.XLSX"), Some(FileKind::Xlsx));
        assert_eq!(FileKind::from_name("notes.txt"), None);
        assert_eq!(FileKind::from_name("noextension"), None);
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Business  Line "), "business line");
        assert_eq!(normalize_header("  AMOUNT"), "amount");
        assert_eq!(normalize_header("Cost\tCenter"), "cost center");
    }

    #[test]
    fn test_csv_rows_numbered_from_two() {
        let data = b"description,amount\nfirst,10\nsecond,20\n";
        let rows = parse_rows(FileKind::Csv, data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[0].get("description"), Some("first"));
        assert_eq!(rows[1].number, 3);
        assert_eq!(rows[1].get("amount"), Some("20"));
    }

    #[test]
    fn test_blank_rows_skipped_but_keep_numbering() {
        let data = b"description,amount\nfirst,10\n,\n  , \nlast,20\n";
        let rows = parse_rows(FileKind::Csv, data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 2);
        assert_eq!(rows[1].number, 5);
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        let rows = parse_rows(FileKind::Csv, b"description,amount\n").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_ragged_rows_tolerated() {
        // Extra cells beyond the header are dropped, short rows leave columns absent
        let data = b"description,amount\nfirst,10,EXTRA\nsecond\n";
        let rows = parse_rows(FileKind::Csv, data).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("amount"), Some("10"));
        assert_eq!(rows[1].get("amount"), None);
    }

    #[test]
    fn test_invalid_xlsx_is_corrupt_file() {
        let result = parse_rows(FileKind::Xlsx, b"this is not a zip archive");
        assert!(matches!(result, Err(ImportError::CorruptFile(_))));
    }
}
