use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::info;

use crate::backup::backup_file;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::registry::{Registry, ACCOUNT_COL, AMOUNT_COL, DATE_COL, LABEL_COL, NAME_COL, SERVICE_COL};
use crate::sheet::{CellSink, CellValue, XlsxDocument};

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}$").expect("static pattern"))
}

/// Parse a `YYYYMMDD` period id. Rejects other shapes and impossible dates.
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    if !date_pattern().is_match(date) {
        return Err(LedgerError::InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| LedgerError::InvalidDate(date.to_string()))
}

impl Ledger<'_> {
    /// `data_dir/YYYY/MMDD`, without touching the filesystem.
    pub fn period_dir(&self, date: &str) -> Result<PathBuf> {
        parse_date(date)?;
        Ok(self.config().data_dir.join(&date[0..4]).join(&date[4..8]))
    }

    /// `data_dir/YYYY/MMDD/YYYYMMDD.xlsx`, without touching the filesystem.
    pub fn document_path(&self, date: &str) -> Result<PathBuf> {
        Ok(self.period_dir(date)?.join(format!("{date}.xlsx")))
    }

    /// Same as [`Ledger::document_path`] but creates the period directory.
    pub fn path_for(&self, date: &str) -> Result<PathBuf> {
        let dir = self.period_dir(date)?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join(format!("{date}.xlsx")))
    }

    /// Start a fresh document for `date` from the template, with the date
    /// filled into every category row. An existing document is backed up
    /// first.
    pub fn initialize(&self, date: &str) -> Result<PathBuf> {
        let day = parse_date(date)?;
        let template = &self.config().template_path;
        if !template.exists() {
            return Err(LedgerError::TemplateMissing(template.display().to_string()));
        }

        let mut doc = XlsxDocument::open(template)?;
        for row in self.registry().data_rows() {
            doc.set_date(row, DATE_COL, day);
        }

        let path = self.path_for(date)?;
        if path.exists() {
            backup_file(&path)?;
        }
        doc.save_to(&path)?;
        info!(date, path = %path.display(), "initialized period document");
        Ok(path)
    }
}

/// Write an empty upload template for `registry`: three header rows, then
/// account code, service code and category name on every category row.
pub fn write_blank_template(path: &Path, registry: &Registry) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut doc = XlsxDocument::blank(path);
    doc.set(1, 1, CellValue::Text("Offering upload".to_string()));
    let headers = [
        (DATE_COL, "Date"),
        (ACCOUNT_COL, "Account"),
        (SERVICE_COL, "Service"),
        (LABEL_COL, "Category"),
        (NAME_COL, "Name"),
        (6, "Memo"),
        (AMOUNT_COL, "Amount"),
    ];
    for (col, title) in headers {
        doc.set(3, col, CellValue::Text(title.to_string()));
    }
    for cat in registry.categories() {
        for row in cat.rows() {
            doc.set(row, ACCOUNT_COL, CellValue::Number(cat.account_code() as f64));
            doc.set(row, SERVICE_COL, CellValue::Number(cat.service_code() as f64));
            doc.set(row, LABEL_COL, CellValue::Text(cat.name().to_string()));
        }
    }
    doc.save()
}
