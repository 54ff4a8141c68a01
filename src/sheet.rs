//! Spreadsheet access for period documents.
//!
//! Writes go through `umya-spreadsheet`, which keeps the template's styling
//! intact. Read-only scans (verify, monthly summary) go through `calamine`.

use std::path::{Path, PathBuf};

use calamine::{Data, Reader};
use chrono::NaiveDate;
use umya_spreadsheet::Spreadsheet;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Numeric view of the cell. Text amounts like "12,000" are accepted.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().replace(',', "").parse().ok(),
            Self::Empty => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.trim().to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Empty => None,
        }
    }
}

/// Anything a ledger can be read from, addressed by 1-based row and column.
pub trait CellSource {
    fn get(&self, row: u32, col: u32) -> CellValue;
}

/// Anything a ledger can be written into.
pub trait CellSink {
    fn set(&mut self, row: u32, col: u32, value: CellValue);
}

pub fn excel_serial(date: NaiveDate) -> f64 {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default();
    (date - base).num_days() as f64
}

// ---------------------------------------------------------------------------
// Read/write document
// ---------------------------------------------------------------------------

/// An open workbook; edits apply to the first worksheet. Dropping it without
/// calling [`XlsxDocument::save`] discards the edits.
pub struct XlsxDocument {
    book: Spreadsheet,
    path: PathBuf,
}

impl XlsxDocument {
    pub fn open(path: &Path) -> Result<Self> {
        let book = umya_spreadsheet::reader::xlsx::read(path)
            .map_err(|e| LedgerError::Sheet(format!("Failed to open {}: {e}", path.display())))?;
        if book.get_sheet(&0).is_none() {
            return Err(LedgerError::Sheet(format!("{} has no worksheets", path.display())));
        }
        Ok(Self {
            book,
            path: path.to_path_buf(),
        })
    }

    /// A new single-sheet workbook that will be saved to `path`.
    pub fn blank(path: &Path) -> Self {
        Self {
            book: umya_spreadsheet::new_file(),
            path: path.to_path_buf(),
        }
    }

    /// Write a date as an Excel serial with a date number format.
    pub fn set_date(&mut self, row: u32, col: u32, date: NaiveDate) {
        if let Some(sheet) = self.book.get_sheet_mut(&0) {
            let cell = sheet.get_cell_mut((col, row));
            cell.set_value_number(excel_serial(date));
            cell.get_style_mut()
                .get_number_format_mut()
                .set_format_code("yyyy-mm-dd");
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// Save through a synced sibling temp file and an atomic rename, so a
    /// crash leaves either the old workbook or the new one.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        umya_spreadsheet::writer::xlsx::write_writer(&self.book, temp.as_file_mut())
            .map_err(|e| LedgerError::Sheet(format!("Failed to save {}: {e}", path.display())))?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| LedgerError::Io(e.error))?;
        Ok(())
    }
}

impl CellSource for XlsxDocument {
    fn get(&self, row: u32, col: u32) -> CellValue {
        let Some(cell) = self.book.get_sheet(&0).and_then(|s| s.get_cell((col, row))) else {
            return CellValue::Empty;
        };
        if let Some(n) = cell.get_value_number() {
            return CellValue::Number(n);
        }
        let value = cell.get_value();
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.into_owned())
        }
    }
}

impl CellSink for XlsxDocument {
    fn set(&mut self, row: u32, col: u32, value: CellValue) {
        if let Some(sheet) = self.book.get_sheet_mut(&0) {
            let cell = sheet.get_cell_mut((col, row));
            match value {
                CellValue::Empty => {
                    cell.set_value_string("");
                }
                CellValue::Text(s) => {
                    cell.set_value_string(s);
                }
                CellValue::Number(n) => {
                    cell.set_value_number(n);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Read-only view
// ---------------------------------------------------------------------------

/// First worksheet of a workbook, loaded for reading only.
pub struct XlsxReader {
    range: calamine::Range<Data>,
}

impl XlsxReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = calamine::open_workbook_auto(path)
            .map_err(|e| LedgerError::Sheet(format!("Failed to open {}: {e}", path.display())))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LedgerError::Sheet(format!("{} has no worksheets", path.display())))?
            .map_err(|e| LedgerError::Sheet(format!("Failed to read {}: {e}", path.display())))?;
        Ok(Self { range })
    }
}

impl CellSource for XlsxReader {
    fn get(&self, row: u32, col: u32) -> CellValue {
        if row == 0 || col == 0 {
            return CellValue::Empty;
        }
        match self.range.get_value((row - 1, col - 1)) {
            Some(Data::Float(f)) => CellValue::Number(*f),
            Some(Data::Int(i)) => CellValue::Number(*i as f64),
            Some(Data::String(s)) if !s.is_empty() => CellValue::Text(s.clone()),
            Some(Data::Bool(b)) => CellValue::Text(b.to_string()),
            Some(Data::DateTime(dt)) => CellValue::Number(dt.as_f64()),
            _ => CellValue::Empty,
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory sheet for unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySheet {
    cells: std::collections::HashMap<(u32, u32), CellValue>,
}

#[cfg(test)]
impl CellSource for MemorySheet {
    fn get(&self, row: u32, col: u32) -> CellValue {
        self.cells.get(&(row, col)).cloned().unwrap_or(CellValue::Empty)
    }
}

#[cfg(test)]
impl CellSink for MemorySheet {
    fn set(&mut self, row: u32, col: u32, value: CellValue) {
        self.cells.insert((row, col), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excel_serial() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 25).unwrap();
        assert_eq!(excel_serial(date), 46047.0);
        assert_eq!(excel_serial(NaiveDate::from_ymd_opt(1900, 3, 1).unwrap()), 61.0);
    }

    #[test]
    fn test_cell_value_views() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text("  ".to_string()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
        assert_eq!(CellValue::Text("12,000".to_string()).as_number(), Some(12000.0));
        assert_eq!(CellValue::Text("abc".to_string()).as_number(), None);
        assert_eq!(CellValue::Text(" Kim ".to_string()).as_text().as_deref(), Some("Kim"));
    }

    #[test]
    fn test_document_save_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.xlsx");
        let mut doc = XlsxDocument::blank(&path);
        doc.set(4, 5, CellValue::Text("Hong".to_string()));
        doc.set(4, 7, CellValue::Number(150000.0));
        doc.set_date(4, 1, NaiveDate::from_ymd_opt(2026, 1, 25).unwrap());
        doc.save().unwrap();
        drop(doc);

        let reader = XlsxReader::open(&path).unwrap();
        assert_eq!(reader.get(4, 5), CellValue::Text("Hong".to_string()));
        assert_eq!(reader.get(4, 7).as_number(), Some(150000.0));
        assert_eq!(reader.get(4, 1).as_number(), Some(46047.0));
        assert!(reader.get(5, 5).is_empty());

        let reopened = XlsxDocument::open(&path).unwrap();
        assert_eq!(reopened.get(4, 7).as_number(), Some(150000.0));
        assert_eq!(reopened.get(4, 5).as_text().as_deref(), Some("Hong"));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20260125.xlsx");
        XlsxDocument::blank(&path).save().unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["20260125.xlsx".to_string()]);
    }

    #[test]
    fn test_save_replaces_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("20260125.xlsx");
        let mut first = XlsxDocument::blank(&path);
        first.set(4, 5, CellValue::Text("Old".to_string()));
        first.save().unwrap();

        let mut second = XlsxDocument::open(&path).unwrap();
        second.set(4, 5, CellValue::Text("New".to_string()));
        second.save().unwrap();

        let reader = XlsxReader::open(&path).unwrap();
        assert_eq!(reader.get(4, 5), CellValue::Text("New".to_string()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_failed_save_cleans_up_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the final rename fail.
        let blocked = dir.path().join("blocked.xlsx");
        std::fs::create_dir(&blocked).unwrap();

        assert!(XlsxDocument::blank(&blocked).save().is_err());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["blocked.xlsx".to_string()]);
        assert!(blocked.is_dir());
    }

    #[test]
    fn test_open_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(XlsxReader::open(&dir.path().join("nope.xlsx")).is_err());
        assert!(XlsxDocument::open(&dir.path().join("nope.xlsx")).is_err());
    }
}
