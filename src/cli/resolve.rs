use colored::Colorize;

use crate::cli::Context;
use crate::error::Result;
use crate::resolver::{resolve, suggest};

pub fn run(ctx: &Context, label: &str) -> Result<()> {
    match resolve(&ctx.registry, label) {
        Some(category) => println!("{label} -> {}", category.green()),
        None => {
            println!("{}", format!("No category matches \"{label}\"").yellow());
            let suggestions = suggest(&ctx.registry, label);
            if !suggestions.is_empty() {
                println!("Did you mean:");
                for s in suggestions {
                    println!("  {} ({:.2})", s.category, s.score);
                }
            }
        }
    }
    Ok(())
}
