use std::path::PathBuf;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::Entry;
use crate::registry::{Registry, AMOUNT_COL, NAME_COL};
use crate::sheet::{CellSource, XlsxReader};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub entries: Vec<Entry>,
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub date: String,
    pub path: PathBuf,
    /// Non-empty categories, in registry order.
    pub categories: Vec<CategorySummary>,
    pub grand_total: f64,
    pub categories_with_data: usize,
}

impl PeriodSummary {
    pub fn category(&self, name: &str) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// Read every category's rows from `source`. A row counts only when both the
/// name and the amount cell hold something.
pub fn scan_period(registry: &Registry, source: &impl CellSource) -> Vec<CategorySummary> {
    let mut result = Vec::new();
    for cat in registry.categories() {
        let mut entries = Vec::new();
        let mut total = 0.0;
        for row in cat.rows() {
            let name = source.get(row, NAME_COL);
            let amount = source.get(row, AMOUNT_COL);
            if name.is_empty() || amount.is_empty() {
                continue;
            }
            let Some(value) = amount.as_number() else {
                warn!(category = cat.name(), row, "skipping row with non-numeric amount");
                continue;
            };
            total += value;
            entries.push(Entry::new(name.as_text().unwrap_or_default(), value));
        }
        if !entries.is_empty() {
            result.push(CategorySummary {
                category: cat.name().to_string(),
                count: entries.len(),
                entries,
                total,
            });
        }
    }
    result
}

impl Ledger<'_> {
    /// Rebuild per-category totals from a period document. `None` when the
    /// document does not exist. Never modifies anything.
    pub fn verify(&self, date: &str) -> Result<Option<PeriodSummary>> {
        let path = self.document_path(date)?;
        if !path.exists() {
            return Ok(None);
        }
        let reader = XlsxReader::open(&path)?;
        let categories = scan_period(self.registry(), &reader);
        let grand_total = categories.iter().map(|c| c.total).sum();
        Ok(Some(PeriodSummary {
            date: date.to_string(),
            path,
            categories_with_data: categories.len(),
            categories,
            grand_total,
        }))
    }
}
