use comfy_table::{Cell, Table};

use crate::cli::Context;
use crate::error::Result;

pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let categories = ctx.registry.categories();
    if json {
        println!("{}", serde_json::to_string_pretty(categories)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Rows", "Slots", "Account", "Service"]);
    for cat in categories {
        let rows = if cat.start_row() == cat.end_row() {
            cat.start_row().to_string()
        } else {
            format!("{}-{}", cat.start_row(), cat.end_row())
        };
        table.add_row(vec![
            Cell::new(cat.name()),
            Cell::new(rows),
            Cell::new(cat.slots()),
            Cell::new(cat.account_code()),
            Cell::new(cat.service_code()),
        ]);
    }
    println!("Categories\n{table}");

    if !ctx.registry.aliases().is_empty() {
        let mut aliases = Table::new();
        aliases.set_header(vec!["Alias", "Category"]);
        for (alias, target) in ctx.registry.aliases() {
            aliases.add_row(vec![Cell::new(alias), Cell::new(target)]);
        }
        println!("Aliases\n{aliases}");
    }
    Ok(())
}
