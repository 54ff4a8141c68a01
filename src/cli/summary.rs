use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::Context;
use crate::error::{LedgerError, Result};
use crate::fmt::amount;

pub fn run(ctx: &Context, month: &str, category: Option<&str>, json: bool) -> Result<()> {
    if let Some(name) = category {
        if ctx.registry.get(name).is_none() {
            return Err(LedgerError::Other(format!("unknown category: {name}")));
        }
    }

    let Some(summary) = ctx.ledger().monthly_summary(month)? else {
        if json {
            let body = serde_json::json!({"error": format!("no ledger documents for {month}")});
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!("{}", format!("No ledger documents for {month}").yellow());
        }
        return Ok(());
    };

    if let Some(name) = category {
        let totals = summary.category(name).cloned().unwrap_or_default();
        if json {
            let body = serde_json::json!({
                "month": summary.month,
                "category": name,
                "count": totals.count,
                "total": totals.total,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        } else {
            println!(
                "{name} in {month}: {} entries, {}",
                totals.count,
                amount(totals.total).bold()
            );
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let mut weeks = Table::new();
    weeks.set_header(vec!["Period", "Total"]);
    for w in &summary.weeks {
        weeks.add_row(vec![Cell::new(&w.period), Cell::new(amount(w.total))]);
    }
    println!("Periods ({})\n{weeks}", summary.weeks.len());

    let mut cats = Table::new();
    cats.set_header(vec!["Category", "Count", "Total"]);
    for c in &summary.categories {
        cats.add_row(vec![
            Cell::new(&c.category),
            Cell::new(c.totals.count),
            Cell::new(amount(c.totals.total)),
        ]);
    }
    cats.add_row(vec![
        Cell::new("TOTAL".green().bold()),
        Cell::new(""),
        Cell::new(amount(summary.grand_total).green().bold()),
    ]);
    println!("Categories\n{cats}");
    Ok(())
}
