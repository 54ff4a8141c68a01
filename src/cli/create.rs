use crate::backup::backup_path;
use crate::cli::Context;
use crate::error::Result;

pub fn run(ctx: &Context, date: &str) -> Result<()> {
    let ledger = ctx.ledger();
    let existed = ledger.document_path(date)?.exists();
    let path = ledger.initialize(date)?;
    if existed {
        println!("Backed up existing document to {}", backup_path(&path).display());
    }
    println!("Created {}", path.display());
    Ok(())
}
