use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::Context;
use crate::error::{LedgerError, Result};
use crate::fmt::amount;
use crate::verifier::CategorySummary;

fn add_category_rows(table: &mut Table, cat: &CategorySummary) {
    for (i, entry) in cat.entries.iter().enumerate() {
        let label = if i == 0 { cat.category.as_str() } else { "" };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(&entry.name),
            Cell::new(amount(entry.amount)),
        ]);
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new(format!("{} entries", cat.count).dimmed()),
        Cell::new(amount(cat.total).bold()),
    ]);
}

pub fn run(ctx: &Context, date: &str, category: Option<&str>, json: bool) -> Result<()> {
    if let Some(name) = category {
        if ctx.registry.get(name).is_none() {
            return Err(LedgerError::Other(format!("unknown category: {name}")));
        }
    }

    let ledger = ctx.ledger();
    let Some(summary) = ledger.verify(date)? else {
        let path = ledger.document_path(date)?;
        if json {
            let body = serde_json::json!({"error": format!("not found: {}", path.display())});
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!("{}", format!("No ledger document for {date} ({})", path.display()).yellow());
        }
        return Ok(());
    };

    if let Some(name) = category {
        let found = summary.category(name);
        if json {
            let empty = CategorySummary {
                category: name.to_string(),
                entries: Vec::new(),
                count: 0,
                total: 0.0,
            };
            println!("{}", serde_json::to_string_pretty(found.unwrap_or(&empty))?);
            return Ok(());
        }
        match found {
            Some(cat) => {
                let mut table = Table::new();
                table.set_header(vec!["Category", "Name", "Amount"]);
                add_category_rows(&mut table, cat);
                println!("Ledger {date}\n{table}");
            }
            None => println!("{}", format!("{name}: no entries on {date}").dimmed()),
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Name", "Amount"]);
    for cat in &summary.categories {
        add_category_rows(&mut table, cat);
    }
    table.add_row(vec![
        Cell::new("TOTAL".green().bold()),
        Cell::new(format!("{} categories", summary.categories_with_data)),
        Cell::new(amount(summary.grand_total).green().bold()),
    ]);
    println!("Ledger {date}\n{table}");
    Ok(())
}
