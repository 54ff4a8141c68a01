use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backup::{backup_file, backup_path};
use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::{Batch, Entry};
use crate::period::parse_date;
use crate::registry::{Registry, AMOUNT_COL, NAME_COL};
use crate::resolver::suggest;
use crate::sheet::{CellSink, CellSource, CellValue, XlsxDocument};
use crate::validator::{parse_batch, validate};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WriteWarning {
    UnknownCategory {
        category: String,
        entries: usize,
        suggestions: Vec<String>,
    },
    Overflow {
        category: String,
        submitted: usize,
        slots: u32,
        dropped: usize,
    },
    Duplicate {
        category: String,
        name: String,
        amount: f64,
        position: usize,
    },
    /// Rows past the new entries that still hold an earlier write's data.
    LeftoverRows {
        category: String,
        rows: Vec<u32>,
    },
}

impl fmt::Display for WriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory {
                category,
                entries,
                suggestions,
            } => {
                write!(f, "Unknown category \"{category}\": {entries} entries skipped")?;
                if !suggestions.is_empty() {
                    write!(f, " (did you mean: {})", suggestions.join(", "))?;
                }
                Ok(())
            }
            Self::Overflow {
                category,
                submitted,
                slots,
                dropped,
            } => write!(
                f,
                "{category}: {submitted} entries > {slots} slots ({dropped} over, not written)"
            ),
            Self::Duplicate {
                category,
                name,
                amount,
                position,
            } => write!(
                f,
                "{category}: entry {position} repeats {name} / {amount}"
            ),
            Self::LeftoverRows { category, rows } => {
                let list: Vec<String> = rows.iter().map(u32::to_string).collect();
                write!(
                    f,
                    "{category}: rows {} still hold entries from an earlier write",
                    list.join(", ")
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStatus {
    Written,
    DryRun,
    Rejected,
}

/// What happened to one category of the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryOutcome {
    pub category: String,
    pub submitted: usize,
    pub generated: usize,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteReport {
    pub status: WriteStatus,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    /// Entries written, or that would be written on a dry run.
    pub written: usize,
    pub categories: Vec<CategoryOutcome>,
    pub grand_total: f64,
    pub warnings: Vec<WriteWarning>,
    pub errors: Vec<String>,
}

impl WriteReport {
    fn rejected(date: &str, errors: Vec<String>) -> Self {
        Self {
            status: WriteStatus::Rejected,
            date: date.to_string(),
            path: None,
            backup: None,
            written: 0,
            categories: Vec::new(),
            grand_total: 0.0,
            warnings: Vec::new(),
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status != WriteStatus::Rejected
    }
}

/// One cell pair to fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub row: u32,
    pub entry: Entry,
}

/// Routing decisions for a batch, before any file is touched.
#[derive(Debug, Default)]
pub struct WritePlan {
    pub placements: Vec<Placement>,
    pub categories: Vec<CategoryOutcome>,
    pub warnings: Vec<WriteWarning>,
}

impl WritePlan {
    pub fn grand_total(&self) -> f64 {
        self.categories.iter().map(|c| c.subtotal).sum()
    }
}

/// Decide where every entry goes: drop unknown categories, flag repeated
/// `(name, amount)` pairs, keep the first `slots` entries of each category.
pub fn plan(registry: &Registry, batch: &Batch) -> WritePlan {
    let mut plan = WritePlan::default();

    for (label, entries) in batch {
        let Some(cat) = registry.get(label) else {
            plan.warnings.push(WriteWarning::UnknownCategory {
                category: label.clone(),
                entries: entries.len(),
                suggestions: suggest(registry, label)
                    .into_iter()
                    .map(|s| s.category)
                    .collect(),
            });
            plan.categories.push(CategoryOutcome {
                category: label.clone(),
                submitted: entries.len(),
                generated: 0,
                subtotal: 0.0,
            });
            continue;
        };

        let mut seen: HashSet<(&str, u64)> = HashSet::new();
        for (i, entry) in entries.iter().enumerate() {
            if !seen.insert((entry.name.as_str(), entry.amount.to_bits())) {
                plan.warnings.push(WriteWarning::Duplicate {
                    category: label.clone(),
                    name: entry.name.clone(),
                    amount: entry.amount,
                    position: i + 1,
                });
            }
        }

        let slots = cat.slots() as usize;
        if entries.len() > slots {
            plan.warnings.push(WriteWarning::Overflow {
                category: label.clone(),
                submitted: entries.len(),
                slots: cat.slots(),
                dropped: entries.len() - slots,
            });
        }

        let kept = &entries[..entries.len().min(slots)];
        for (offset, entry) in (0u32..).zip(kept) {
            plan.placements.push(Placement {
                row: cat.start_row() + offset,
                entry: entry.clone(),
            });
        }
        plan.categories.push(CategoryOutcome {
            category: label.clone(),
            submitted: entries.len(),
            generated: kept.len(),
            subtotal: kept.iter().map(|e| e.amount).sum(),
        });
    }
    plan
}

/// Fill the name and amount cells for every placement.
pub fn place(doc: &mut impl CellSink, placements: &[Placement]) {
    for p in placements {
        doc.set(p.row, NAME_COL, CellValue::Text(p.entry.name.clone()));
        doc.set(p.row, AMOUNT_COL, CellValue::Number(p.entry.amount));
    }
}

/// Rows of each written category past its new entries that are not empty.
pub fn leftover_rows(
    registry: &Registry,
    doc: &impl CellSource,
    outcomes: &[CategoryOutcome],
) -> Vec<WriteWarning> {
    let mut warnings = Vec::new();
    for outcome in outcomes {
        let Some(cat) = registry.get(&outcome.category) else {
            continue;
        };
        let first_unused = cat.start_row() + outcome.generated as u32;
        let rows: Vec<u32> = (first_unused..=cat.end_row())
            .filter(|&row| !doc.get(row, NAME_COL).is_empty() || !doc.get(row, AMOUNT_COL).is_empty())
            .collect();
        if !rows.is_empty() {
            warnings.push(WriteWarning::LeftoverRows {
                category: outcome.category.clone(),
                rows,
            });
        }
    }
    warnings
}

impl Ledger<'_> {
    /// Validate `batch` and write it into the period document for `date`.
    ///
    /// A malformed batch gives a `Rejected` report and touches nothing.
    /// Unknown categories, overflow and duplicates are warnings on an
    /// otherwise successful write. An existing document is backed up
    /// before the first cell changes.
    pub fn write(&self, date: &str, batch: &Value, dry_run: bool) -> Result<WriteReport> {
        parse_date(date)?;

        let errors = validate(batch);
        if !errors.is_empty() {
            warn!(date, errors = errors.len(), "batch rejected");
            return Ok(WriteReport::rejected(date, errors));
        }

        let plan = plan(self.registry(), &parse_batch(batch));
        let mut report = WriteReport {
            status: WriteStatus::DryRun,
            date: date.to_string(),
            path: None,
            backup: None,
            written: plan.placements.len(),
            grand_total: plan.grand_total(),
            categories: plan.categories,
            warnings: plan.warnings,
            errors: Vec::new(),
        };
        for w in &report.warnings {
            warn!(date, "{w}");
        }
        if dry_run {
            return Ok(report);
        }

        let path = self.document_path(date)?;
        if path.exists() {
            report.backup = Some(backup_file(&path)?);
        } else {
            // A backup without its document belongs to some older state.
            let stale = backup_path(&path);
            if stale.exists() {
                std::fs::remove_file(&stale)?;
                debug!(path = %stale.display(), "removed backup of a missing document");
            }
            self.initialize(date)?;
        }

        let mut doc = XlsxDocument::open(&path)?;
        place(&mut doc, &plan.placements);
        for w in leftover_rows(self.registry(), &doc, &report.categories) {
            warn!(date, "{w}");
            report.warnings.push(w);
        }
        doc.save()?;
        info!(date, written = report.written, path = %path.display(), "entries written");

        report.status = WriteStatus::Written;
        report.path = Some(path);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::RollbackOutcome;
    use crate::ledger::testutil::fixture;
    use crate::sheet::MemorySheet;
    use serde_json::json;

    fn entries(n: usize) -> Vec<Entry> {
        (0..n).map(|i| Entry::new(format!("member{i}"), 100.0)).collect()
    }

    #[test]
    fn test_plan_rows_start_at_category_start() {
        let registry = Registry::standard().unwrap();
        let batch = vec![("relief".to_string(), vec![Entry::new("A", 1.0), Entry::new("B", 2.0)])];
        let plan = plan(&registry, &batch);
        assert_eq!(plan.placements[0].row, 62);
        assert_eq!(plan.placements[1].row, 63);
        assert!(plan.warnings.is_empty());
        assert_eq!(plan.grand_total(), 3.0);
    }

    #[test]
    fn test_plan_overflow_cites_excess() {
        let registry = Registry::standard().unwrap();
        let batch = vec![("tithe".to_string(), entries(25))];
        let plan = plan(&registry, &batch);
        assert_eq!(plan.placements.len(), 23);
        assert_eq!(plan.placements.last().unwrap().row, 26);
        assert_eq!(plan.placements.last().unwrap().entry.name, "member22");
        assert_eq!(
            plan.warnings,
            vec![WriteWarning::Overflow {
                category: "tithe".to_string(),
                submitted: 25,
                slots: 23,
                dropped: 2,
            }]
        );
        assert!(plan.warnings[0].to_string().contains("2 over"));
    }

    #[test]
    fn test_plan_flags_duplicates_but_keeps_them() {
        let registry = Registry::standard().unwrap();
        let batch = vec![(
            "thanksgiving".to_string(),
            vec![
                Entry::new("Kim", 1000.0),
                Entry::new("Kim", 1000.0),
                Entry::new("Kim", 2000.0),
                Entry::new("Kim", 1000.0),
            ],
        )];
        let plan = plan(&registry, &batch);
        assert_eq!(plan.placements.len(), 4);
        let positions: Vec<usize> = plan
            .warnings
            .iter()
            .filter_map(|w| match w {
                WriteWarning::Duplicate { position, .. } => Some(*position),
                _ => None,
            })
            .collect();
        assert_eq!(positions, vec![2, 4]);
    }

    #[test]
    fn test_plan_unknown_category() {
        let registry = Registry::standard().unwrap();
        let batch = vec![("foo".to_string(), vec![Entry::new("A", 1.0)])];
        let plan = plan(&registry, &batch);
        assert!(plan.placements.is_empty());
        assert_eq!(plan.categories[0].generated, 0);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].to_string().contains("\"foo\""));
    }

    #[test]
    fn test_place_fills_name_and_amount() {
        let mut sheet = MemorySheet::default();
        place(
            &mut sheet,
            &[Placement {
                row: 54,
                entry: Entry::new("Youth group", 35000.0),
            }],
        );
        assert_eq!(sheet.get(54, NAME_COL), CellValue::Text("Youth group".to_string()));
        assert_eq!(sheet.get(54, AMOUNT_COL), CellValue::Number(35000.0));
    }

    #[test]
    fn test_write_then_verify() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let batch = json!({"tithe": [
            {"name": "X", "amount": 100000},
            {"name": "Y", "amount": 200000},
        ]});
        let report = ledger.write("20260125", &batch, false).unwrap();
        assert_eq!(report.status, WriteStatus::Written);
        assert_eq!(report.written, 2);
        assert!(report.backup.is_none());

        let summary = ledger.verify("20260125").unwrap().unwrap();
        let tithe = summary.category("tithe").unwrap();
        assert_eq!(tithe.count, 2);
        assert_eq!(tithe.total, 300000.0);
        assert_eq!(tithe.entries[0], Entry::new("X", 100000.0));
        assert_eq!(summary.grand_total, 300000.0);
        assert_eq!(summary.categories_with_data, 1);
    }

    #[test]
    fn test_verify_is_idempotent() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let batch = json!({"relief": [{"name": "A", "amount": 5000}], "cell": [{"name": "B", "amount": 7000}]});
        ledger.write("20260125", &batch, false).unwrap();
        let first = ledger.verify("20260125").unwrap();
        let second = ledger.verify("20260125").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejected_batch_touches_nothing() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let report = ledger
            .write("20260125", &json!({"tithe": [{"name": "Z"}]}), false)
            .unwrap();
        assert_eq!(report.status, WriteStatus::Rejected);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("amount"));
        let path = ledger.document_path("20260125").unwrap();
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let batch = json!({"tithe": [{"name": "A", "amount": 10}, {"name": "B", "amount": 20}]});
        let report = ledger.write("20260125", &batch, true).unwrap();
        assert_eq!(report.status, WriteStatus::DryRun);
        assert_eq!(report.written, 2);
        assert_eq!(report.grand_total, 30.0);
        assert!(report.path.is_none());
        assert!(!ledger.document_path("20260125").unwrap().exists());
        assert!(!config.data_dir.exists());
    }

    #[test]
    fn test_unknown_category_write_succeeds() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let report = ledger
            .write("20260125", &json!({"foo": [{"name": "A", "amount": 1}]}), false)
            .unwrap();
        assert!(report.is_success());
        let foo = report.categories.iter().find(|c| c.category == "foo").unwrap();
        assert_eq!(foo.generated, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].to_string().contains("foo"));
        assert_eq!(report.written, 0);
    }

    #[test]
    fn test_overflow_persists_exactly_slots_in_order() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let list: Vec<Value> = (0..9)
            .map(|i| json!({"name": format!("s{i}"), "amount": 1000 + i}))
            .collect();
        let report = ledger
            .write("20260125", &json!({"relief": list}), false)
            .unwrap();
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, WriteWarning::Overflow { dropped: 2, .. })));

        let summary = ledger.verify("20260125").unwrap().unwrap();
        let relief = summary.category("relief").unwrap();
        assert_eq!(relief.count, 7);
        let names: Vec<_> = relief.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["s0", "s1", "s2", "s3", "s4", "s5", "s6"]);
        assert_eq!(relief.total, (1000..1007).sum::<i32>() as f64);
    }

    #[test]
    fn test_second_write_takes_backup() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        let batch = json!({"tithe": [{"name": "A", "amount": 100}]});
        ledger.write("20260125", &batch, false).unwrap();
        let report = ledger.write("20260125", &batch, false).unwrap();
        let path = report.path.unwrap();
        assert_eq!(report.backup, Some(backup_path(&path)));
        assert!(backup_path(&path).exists());
    }

    #[test]
    fn test_rollback_restores_previous_write() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        ledger
            .write("20260125", &json!({"tithe": [{"name": "A", "amount": 100}]}), false)
            .unwrap();
        let before = ledger.verify("20260125").unwrap().unwrap();

        ledger
            .write(
                "20260125",
                &json!({"tithe": [{"name": "B", "amount": 900}], "relief": [{"name": "C", "amount": 50}]}),
                false,
            )
            .unwrap();
        let during = ledger.verify("20260125").unwrap().unwrap();
        assert_eq!(during.grand_total, 950.0);

        let outcome = ledger.rollback("20260125").unwrap();
        assert!(matches!(outcome, RollbackOutcome::Restored { .. }));
        let after = ledger.verify("20260125").unwrap().unwrap();
        assert_eq!(after.categories, before.categories);
        assert_eq!(after.grand_total, 100.0);
        let path = ledger.document_path("20260125").unwrap();
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_fresh_document_drops_orphaned_backup() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        ledger
            .write("20260125", &json!({"tithe": [{"name": "A", "amount": 100}]}), false)
            .unwrap();
        ledger
            .write("20260125", &json!({"tithe": [{"name": "B", "amount": 200}]}), false)
            .unwrap();
        let path = ledger.document_path("20260125").unwrap();
        std::fs::remove_file(&path).unwrap();

        let report = ledger
            .write("20260125", &json!({"tithe": [{"name": "C", "amount": 300}]}), false)
            .unwrap();
        assert!(report.backup.is_none());
        assert!(!backup_path(&path).exists());

        let outcome = ledger.rollback("20260125").unwrap();
        assert!(matches!(outcome, RollbackOutcome::NoBackup { .. }));
        assert_eq!(ledger.verify("20260125").unwrap().unwrap().grand_total, 300.0);
    }

    #[test]
    fn test_shorter_rewrite_warns_about_leftover_rows() {
        let (_dir, config, registry) = fixture();
        let ledger = Ledger::new(&config, &registry);
        ledger
            .write(
                "20260125",
                &json!({"tithe": [
                    {"name": "A", "amount": 1},
                    {"name": "B", "amount": 2},
                    {"name": "C", "amount": 3},
                ]}),
                false,
            )
            .unwrap();
        let report = ledger
            .write("20260125", &json!({"tithe": [{"name": "Z", "amount": 10}]}), false)
            .unwrap();
        assert_eq!(
            report.warnings,
            vec![WriteWarning::LeftoverRows {
                category: "tithe".to_string(),
                rows: vec![5, 6],
            }]
        );
        assert!(report.warnings[0].to_string().contains("5, 6"));

        let tithe = ledger.verify("20260125").unwrap().unwrap();
        assert_eq!(tithe.category("tithe").unwrap().count, 3);
    }

    #[test]
    fn test_leftover_rows_ignores_unknown_and_full_categories() {
        let registry = Registry::standard().unwrap();
        let mut sheet = MemorySheet::default();
        sheet.set(54, NAME_COL, CellValue::Text("Youth".to_string()));
        sheet.set(54, AMOUNT_COL, CellValue::Number(1.0));
        let outcomes = vec![
            CategoryOutcome {
                category: "youth".to_string(),
                submitted: 1,
                generated: 1,
                subtotal: 1.0,
            },
            CategoryOutcome {
                category: "foo".to_string(),
                submitted: 1,
                generated: 0,
                subtotal: 0.0,
            },
        ];
        assert!(leftover_rows(&registry, &sheet, &outcomes).is_empty());
    }
}
