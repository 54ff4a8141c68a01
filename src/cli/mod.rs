pub mod categories;
pub mod create;
pub mod init;
pub mod names;
pub mod resolve;
pub mod rollback;
pub mod status;
pub mod summary;
pub mod verify;
pub mod write;

use clap::{Parser, Subcommand};

use crate::ledger::Ledger;
use crate::registry::Registry;
use crate::settings::{LedgerConfig, Settings};

/// Everything a command needs, built once in `main`.
pub struct Context {
    pub settings: Settings,
    pub config: LedgerConfig,
    pub registry: Registry,
}

impl Context {
    pub fn ledger(&self) -> Ledger<'_> {
        Ledger::new(&self.config, &self.registry)
    }
}

#[derive(Parser)]
#[command(name = "offertory", about = "Record offerings into dated ledger spreadsheets and rebuild totals.")]
pub struct Cli {
    /// Ledger data directory (default from settings: ~/Documents/offertory/data)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,
    /// Template workbook copied for every new period
    #[arg(long, global = true)]
    pub template: Option<String>,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save settings, create the data directory and a blank template if none exists.
    Init,
    /// Start a fresh ledger document for a date (backs up an existing one).
    Create {
        /// Period date: YYYYMMDD
        date: String,
    },
    /// Write offering entries into a period document.
    Write {
        /// Period date: YYYYMMDD
        date: String,
        /// JSON batch: {"category": [{"name": ..., "amount": ...}]} (default: stdin)
        data: Option<String>,
        /// Read the JSON batch from a file
        #[arg(long, conflicts_with = "data")]
        file: Option<String>,
        /// Validate and summarize without touching any file
        #[arg(long = "dry-run")]
        dry_run: bool,
        /// Map category labels through aliases and fuzzy matching first
        #[arg(long)]
        resolve: bool,
        /// Correct entry names against the member roster first
        #[arg(long = "correct-names")]
        correct_names: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read a period document back into per-category totals.
    Verify {
        /// Period date: YYYYMMDD
        date: String,
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Restore a period document from its backup.
    Rollback {
        /// Period date: YYYYMMDD
        date: String,
    },
    /// Totals for every period in a month.
    Summary {
        /// Month: YYYYMM
        month: String,
        /// Only show this category
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show the category row layout.
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Map a raw label to a category, with suggestions.
    Resolve {
        /// Label as written on the slip
        label: String,
    },
    /// Correct member names against the roster.
    Names {
        /// Names to check
        names: Vec<String>,
        /// Minimum similarity for a correction
        #[arg(long, default_value_t = crate::roster::DEFAULT_CUTOFF)]
        cutoff: f64,
        /// Add a new member to the roster instead
        #[arg(long, conflicts_with = "names")]
        add: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show configuration and ledger statistics.
    Status,
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}
