mod aggregator;
mod backup;
mod cli;
mod error;
mod fmt;
mod ledger;
mod models;
mod period;
mod registry;
mod resolver;
mod roster;
mod settings;
mod sheet;
mod validator;
mod verifier;
mod writer;

use std::path::Path;

use anyhow::Context as _;
use clap::{CommandFactory, Parser};
use tracing::error;

use cli::{Cli, Commands, Context};
use registry::Registry;
use settings::{load_settings, Settings};

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(settings: &Settings) -> anyhow::Result<Registry> {
    match &settings.registry_file {
        Some(path) => Registry::from_json_file(Path::new(path))
            .with_context(|| format!("loading category table {path}")),
        None => Registry::standard().context("built-in category table"),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "offertory", &mut std::io::stdout());
        return;
    }

    let settings = load_settings();
    // A broken category table would put entries in the wrong rows.
    let registry = match load_registry(&settings) {
        Ok(r) => r,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Fatal: {e:#}");
            std::process::exit(2);
        }
    };
    let config = settings.ledger_config(cli.data_dir.as_deref(), cli.template.as_deref());
    let ctx = Context {
        settings,
        config,
        registry,
    };

    let result = match cli.command {
        Commands::Init => cli::init::run(&ctx),
        Commands::Create { date } => cli::create::run(&ctx, &date),
        Commands::Write {
            date,
            data,
            file,
            dry_run,
            resolve,
            correct_names,
            json,
        } => cli::write::run(
            &ctx,
            cli::write::WriteArgs {
                date: &date,
                data: data.as_deref(),
                file: file.as_deref(),
                dry_run,
                resolve,
                correct_names,
                json,
            },
        ),
        Commands::Verify {
            date,
            category,
            json,
        } => cli::verify::run(&ctx, &date, category.as_deref(), json),
        Commands::Rollback { date } => cli::rollback::run(&ctx, &date),
        Commands::Summary {
            month,
            category,
            json,
        } => cli::summary::run(&ctx, &month, category.as_deref(), json),
        Commands::Categories { json } => cli::categories::list(&ctx, json),
        Commands::Resolve { label } => cli::resolve::run(&ctx, &label),
        Commands::Names {
            names,
            cutoff,
            add,
            json,
        } => match add {
            Some(name) => cli::names::add(&ctx, &name),
            None => cli::names::check(&ctx, &names, cutoff, json),
        },
        Commands::Status => cli::status::run(&ctx),
        Commands::Completions { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
