use std::io::Read;
use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};
use serde_json::Value;

use crate::cli::Context;
use crate::error::{LedgerError, Result};
use crate::fmt::amount;
use crate::resolver::resolve_labels;
use crate::roster::{CorrectionStatus, Roster, DEFAULT_CUTOFF};
use crate::writer::{WriteReport, WriteStatus};

pub struct WriteArgs<'a> {
    pub date: &'a str,
    pub data: Option<&'a str>,
    pub file: Option<&'a str>,
    pub dry_run: bool,
    pub resolve: bool,
    pub correct_names: bool,
    pub json: bool,
}

fn read_batch(data: Option<&str>, file: Option<&str>) -> Result<Value> {
    let raw = match (data, file) {
        (Some(d), _) => d.to_string(),
        (None, Some(f)) => std::fs::read_to_string(f)?,
        (None, None) => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

/// Replace entry names with their roster match where the roster is
/// confident. Returns `(from, to)` for each change.
fn correct_entry_names(batch: &mut Value, roster: &Roster) -> Vec<(String, String)> {
    let mut changes = Vec::new();
    let Some(groups) = batch.as_object_mut() else {
        return changes;
    };
    for entries in groups.values_mut() {
        let Some(list) = entries.as_array_mut() else {
            continue;
        };
        for entry in list {
            let Some(name) = entry.get("name").and_then(Value::as_str) else {
                continue;
            };
            let fix = roster.correct(name, DEFAULT_CUTOFF);
            if fix.status == CorrectionStatus::Corrected {
                changes.push((fix.original.clone(), fix.corrected.clone()));
                entry["name"] = Value::String(fix.corrected);
            }
        }
    }
    changes
}

pub fn run(ctx: &Context, args: WriteArgs<'_>) -> Result<()> {
    let mut batch = read_batch(args.data, args.file)?;

    if args.resolve {
        let (resolved, renamed) = resolve_labels(&ctx.registry, &batch);
        batch = resolved;
        if !args.json {
            for (from, to) in &renamed {
                println!("Category \"{from}\" -> {to}");
            }
        }
    }

    if args.correct_names {
        let roster = Roster::load(Path::new(&ctx.settings.members_file))?;
        let changes = correct_entry_names(&mut batch, &roster);
        if !args.json {
            for (from, to) in &changes {
                println!("Name \"{from}\" -> {to}");
            }
        }
    }

    let report = ctx.ledger().write(args.date, &batch, args.dry_run)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        return Err(LedgerError::Other(format!(
            "batch rejected with {} validation error(s)",
            report.errors.len()
        )));
    }
    Ok(())
}

fn print_report(report: &WriteReport) {
    match report.status {
        WriteStatus::Rejected => {
            println!("{}", "Validation failed:".red().bold());
            for e in &report.errors {
                println!("  - {e}");
            }
            return;
        }
        WriteStatus::DryRun => {
            println!("{}", format!("Dry run for {} (nothing written)", report.date).bold());
        }
        WriteStatus::Written => {
            if let Some(path) = &report.path {
                println!(
                    "{}",
                    format!("Wrote {} entries -> {}", report.written, path.display()).green()
                );
            }
            if let Some(backup) = &report.backup {
                println!("Previous version saved as {}", backup.display());
            }
        }
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Submitted", "Written", "Subtotal"]);
    for c in &report.categories {
        table.add_row(vec![
            Cell::new(&c.category),
            Cell::new(c.submitted),
            Cell::new(c.generated),
            Cell::new(amount(c.subtotal)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(report.written),
        Cell::new(amount(report.grand_total)),
    ]);
    println!("{table}");

    for w in &report.warnings {
        println!("{} {w}", "warning:".yellow().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_correct_entry_names() {
        let roster = Roster::from_names(vec!["권언성".to_string(), "홍길동".to_string()]);
        let mut batch = json!({"tithe": [
            {"name": "천인성", "amount": 1000},
            {"name": "홍길동", "amount": 2000},
        ]});
        let changes = correct_entry_names(&mut batch, &roster);
        assert_eq!(changes, vec![("천인성".to_string(), "권언성".to_string())]);
        assert_eq!(batch["tithe"][0]["name"], "권언성");
        assert_eq!(batch["tithe"][1]["name"], "홍길동");
    }

    #[test]
    fn test_read_batch_inline() {
        let v = read_batch(Some(r#"{"tithe": []}"#), None).unwrap();
        assert!(v["tithe"].is_array());
        assert!(read_batch(Some("{not json"), None).is_err());
    }
}
