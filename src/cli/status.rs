use std::path::{Path, PathBuf};

use crate::backup::backup_path;
use crate::cli::Context;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::roster::Roster;
use crate::settings::settings_file_exists;

/// Period documents under `data_dir/YYYY/MMDD/`, sorted by path.
fn period_documents(data_dir: &Path) -> Vec<PathBuf> {
    let mut docs = Vec::new();
    let Ok(years) = std::fs::read_dir(data_dir) else {
        return docs;
    };
    for year in years.filter_map(|e| e.ok()).filter(|e| e.path().is_dir()) {
        let Ok(days) = std::fs::read_dir(year.path()) else {
            continue;
        };
        for day in days.filter_map(|e| e.ok()).filter(|e| e.path().is_dir()) {
            let date = format!(
                "{}{}",
                year.file_name().to_string_lossy(),
                day.file_name().to_string_lossy()
            );
            let doc = day.path().join(format!("{date}.xlsx"));
            if doc.exists() {
                docs.push(doc);
            }
        }
    }
    docs.sort();
    docs
}

pub fn run(ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    println!(
        "Settings:   {}",
        if settings_file_exists() { "saved" } else { "(defaults)" }
    );
    println!("Data dir:   {}", config.data_dir.display());

    if config.template_path.exists() {
        let size = std::fs::metadata(&config.template_path)?.len();
        println!(
            "Template:   {} ({})",
            config.template_path.display(),
            format_bytes(size)
        );
    } else {
        println!(
            "Template:   {} (missing, run `offertory init`)",
            config.template_path.display()
        );
    }

    let roster = Roster::load(Path::new(&ctx.settings.members_file))?;
    println!("Roster:     {} members", roster.members().len());

    let rows = ctx.registry.data_rows();
    println!(
        "Categories: {} (rows {}-{})",
        ctx.registry.categories().len(),
        rows.first().copied().unwrap_or_default(),
        rows.last().copied().unwrap_or_default()
    );

    let docs = period_documents(&config.data_dir);
    let backups = docs.iter().filter(|d| backup_path(d).exists()).count();
    println!();
    println!("Periods:       {}", docs.len());
    println!("With backup:   {backups}");
    if let Some(latest) = docs.last() {
        println!("Latest:        {}", latest.display());
    }
    Ok(())
}
