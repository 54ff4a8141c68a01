use std::path::Path;

use comfy_table::{Cell, Table};

use crate::cli::Context;
use crate::error::Result;
use crate::roster::{add_member, Roster};

pub fn check(ctx: &Context, names: &[String], cutoff: f64, json: bool) -> Result<()> {
    let roster = Roster::load(Path::new(&ctx.settings.members_file))?;
    let results = roster.correct_all(names, cutoff);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Original", "Corrected", "Status", "Confidence"]);
    for r in &results {
        table.add_row(vec![
            Cell::new(&r.original),
            Cell::new(&r.corrected),
            Cell::new(format!("{:?}", r.status).to_lowercase()),
            Cell::new(format!("{:.2}", r.confidence)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn add(ctx: &Context, name: &str) -> Result<()> {
    let path = Path::new(&ctx.settings.members_file);
    if add_member(path, name)? {
        println!("Added {name} to {}", path.display());
    } else {
        println!("{name} is already on the roster");
    }
    Ok(())
}
