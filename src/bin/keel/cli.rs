//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Keel - typed build parameters and convention composition for project trees
#[derive(Parser)]
#[command(name = "keel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to Keel.toml (or the directory containing it)
    #[arg(long, global = true, env = "KEEL_MANIFEST_PATH")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the structure of every module without configuring it
    Check,

    /// Configure modules and print their resolved configuration
    Resolve(ResolveArgs),

    /// List declared parameters and their values
    Params(ParamsArgs),

    /// List convention units and what they require
    Conventions(ConventionsArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Only configure these modules
    #[arg(short, long = "module", value_name = "MODULE")]
    pub modules: Vec<String>,

    /// Print configurations as JSON
    #[arg(long)]
    pub json: bool,

    /// Set a parameter value (NAME=VALUE)
    #[arg(short = 'P', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args)]
pub struct ParamsArgs {
    /// Print parameters as JSON
    #[arg(long)]
    pub json: bool,

    /// Set a parameter value (NAME=VALUE)
    #[arg(short = 'P', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

#[derive(Args)]
pub struct ConventionsArgs {
    /// Show the requires tree of a single unit
    pub unit: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
