use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::CategoryTotal;
use crate::sheet::XlsxReader;
use crate::verifier::scan_period;

fn month_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}(0[1-9]|1[0-2])$").expect("static pattern"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCategory {
    pub category: String,
    #[serde(flatten)]
    pub totals: CategoryTotal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    pub month: String,
    /// One entry per period document found, in date order.
    pub weeks: Vec<PeriodTotal>,
    /// Categories with at least one entry, in registry order.
    pub categories: Vec<MonthlyCategory>,
    pub grand_total: f64,
}

impl MonthlySummary {
    pub fn category(&self, name: &str) -> Option<&CategoryTotal> {
        self.categories
            .iter()
            .find(|c| c.category == name)
            .map(|c| &c.totals)
    }
}

impl Ledger<'_> {
    /// Sum every period document of a `YYYYMM` month. `None` when the month
    /// has no documents at all.
    pub fn monthly_summary(&self, year_month: &str) -> Result<Option<MonthlySummary>> {
        if !month_pattern().is_match(year_month) {
            return Err(LedgerError::InvalidMonth(year_month.to_string()));
        }
        let (year, month) = year_month.split_at(4);
        let year_dir = self.config().data_dir.join(year);
        if !year_dir.is_dir() {
            return Ok(None);
        }

        let mut period_dirs: Vec<String> = std::fs::read_dir(&year_dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| {
                name.len() == 4 && name.chars().all(|c| c.is_ascii_digit()) && name.starts_with(month)
            })
            .collect();
        period_dirs.sort();

        let registry = self.registry();
        let mut totals: Vec<CategoryTotal> = vec![CategoryTotal::default(); registry.categories().len()];
        let mut weeks = Vec::new();

        for month_day in period_dirs {
            let period = format!("{year}{month_day}");
            let path = year_dir.join(&month_day).join(format!("{period}.xlsx"));
            if !path.exists() {
                debug!(period, "no document in period directory, skipping");
                continue;
            }
            let reader = XlsxReader::open(&path)?;
            let mut period_total = 0.0;
            for summary in scan_period(registry, &reader) {
                let Some(idx) = registry
                    .categories()
                    .iter()
                    .position(|c| c.name() == summary.category)
                else {
                    continue;
                };
                for entry in &summary.entries {
                    totals[idx].add(entry.amount);
                }
                period_total += summary.total;
            }
            weeks.push(PeriodTotal {
                period,
                total: period_total,
            });
        }

        if weeks.is_empty() {
            return Ok(None);
        }

        let categories = registry
            .categories()
            .iter()
            .zip(totals)
            .filter(|(_, t)| t.count > 0)
            .map(|(c, totals)| MonthlyCategory {
                category: c.name().to_string(),
                totals,
            })
            .collect();
        let grand_total = weeks.iter().map(|w| w.total).sum();
        Ok(Some(MonthlySummary {
            month: year_month.to_string(),
            weeks,
            categories,
            grand_total,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::fixture;
    use serde_json::json;

    #[test]
    fn test_two_periods_in_month() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        ledger
            .write("20260104", &json!({"tithe": [{"name": "A", "amount": 100000}]}), false)
            .unwrap();
        ledger
            .write(
                "20260111",
                &json!({
                    "tithe": [{"name": "B", "amount": 150000}],
                    "relief": [{"name": "C", "amount": 50000}],
                }),
                false,
            )
            .unwrap();
        // other month, must not be counted
        ledger
            .write("20260201", &json!({"tithe": [{"name": "D", "amount": 999}]}), false)
            .unwrap();

        let summary = ledger.monthly_summary("202601").unwrap().unwrap();
        assert_eq!(summary.weeks.len(), 2);
        assert_eq!(summary.weeks[0], PeriodTotal { period: "20260104".to_string(), total: 100000.0 });
        assert_eq!(summary.weeks[1].total, 200000.0);
        assert_eq!(summary.grand_total, 300000.0);
        let tithe = summary.category("tithe").unwrap();
        assert_eq!(tithe.count, 2);
        assert_eq!(tithe.total, 250000.0);
        assert_eq!(summary.categories[1].category, "relief");
    }

    #[test]
    fn test_directory_without_document_is_skipped() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        ledger
            .write("20260118", &json!({"cell": [{"name": "A", "amount": 10}]}), false)
            .unwrap();
        ledger.path_for("20260125").unwrap();
        let summary = ledger.monthly_summary("202601").unwrap().unwrap();
        assert_eq!(summary.weeks.len(), 1);
        assert_eq!(summary.grand_total, 10.0);
    }

    #[test]
    fn test_month_without_periods_is_not_found() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        assert!(ledger.monthly_summary("202603").unwrap().is_none());
        ledger
            .write("20260301", &json!({"cell": [{"name": "A", "amount": 10}]}), false)
            .unwrap();
        assert!(ledger.monthly_summary("202604").unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_month() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        assert!(matches!(
            ledger.monthly_summary("2026-01"),
            Err(LedgerError::InvalidMonth(_))
        ));
        assert!(ledger.monthly_summary("202613").is_err());
    }
}
