use colored::Colorize;

use crate::backup::RollbackOutcome;
use crate::cli::Context;
use crate::error::Result;

pub fn run(ctx: &Context, date: &str) -> Result<()> {
    let outcome = ctx.ledger().rollback(date)?;
    match outcome {
        RollbackOutcome::Restored { .. } => println!("{}", outcome.message().green()),
        RollbackOutcome::NoBackup { .. } => println!("{}", outcome.message().yellow()),
    }
    Ok(())
}
