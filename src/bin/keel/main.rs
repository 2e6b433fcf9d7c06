//! Keel CLI - typed build parameters and convention composition

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keel::util::diagnostic::emit;
use keel::{ConfigureError, GlobalContext};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<ConfigureError>() {
            Some(err) => emit(&err.to_diagnostic(), color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("keel=debug")
    } else {
        EnvFilter::new("keel=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let ctx = GlobalContext::new()?;

    let manifest_path = cli.manifest_path.as_deref();

    match cli.command {
        Commands::Check => commands::check::execute(&ctx, manifest_path),
        Commands::Resolve(args) => commands::resolve::execute(args, &ctx, manifest_path),
        Commands::Params(args) => commands::params::execute(args, &ctx, manifest_path),
        Commands::Conventions(args) => {
            commands::conventions::execute(args, &ctx, manifest_path)
        }
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
