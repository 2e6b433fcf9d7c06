//! `keel resolve` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ResolveArgs;
use keel::ops::{configure_workspace, load_workspace, ConfigureOptions};
use keel::{GlobalContext, ResolvedConfiguration};

pub fn execute(args: ResolveArgs, ctx: &GlobalContext, manifest_path: Option<&Path>) -> Result<()> {
    let manifest_path = super::locate_manifest(ctx, manifest_path)?;

    let opts = ConfigureOptions {
        overrides: super::parse_overrides(&args.params)?,
        modules: args.modules,
    };

    let ws = load_workspace(ctx, &manifest_path, &opts.overrides)?;
    let tree = configure_workspace(&ws, &opts)?;

    if args.json {
        let json = serde_json::to_string_pretty(&tree)
            .context("failed to serialize resolved configuration")?;
        println!("{}", json);
        return Ok(());
    }

    for (i, config) in tree.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_configuration(config, ws.root());
    }

    Ok(())
}

fn print_configuration(config: &ResolvedConfiguration, root: &Path) {
    let path = config.path.strip_prefix(root).unwrap_or(&config.path);
    println!("{} ({})", config.module, path.display());
    println!("  applied: {}", config.applied.join(", "));
    if !config.capabilities.is_empty() {
        println!("  capabilities: {}", config.capabilities.join(", "));
    }
    for (key, value) in &config.settings {
        println!("  {} = {}", key, value);
    }
}
