//! `keel params` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ParamsArgs;
use keel::ops::{list_parameters, load_workspace, ValueSource};
use keel::GlobalContext;

pub fn execute(args: ParamsArgs, ctx: &GlobalContext, manifest_path: Option<&Path>) -> Result<()> {
    let manifest_path = super::locate_manifest(ctx, manifest_path)?;
    let overrides = super::parse_overrides(&args.params)?;

    let ws = load_workspace(ctx, &manifest_path, &overrides)?;
    let report = list_parameters(ws.params());

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize parameters")?;
        println!("{}", json);
        return Ok(());
    }

    if report.is_empty() {
        println!("no parameters declared");
        return Ok(());
    }

    for param in &report {
        let value = match (&param.value, param.source) {
            (Some(value), ValueSource::Override) => format!("{} (override)", value),
            (Some(value), _) => value.to_string(),
            (None, _) => "<unset>".to_string(),
        };
        println!("{}: {} = {}", param.name, param.param_type, value);
        if !param.description.is_empty() {
            println!("    {}", param.description);
        }
    }

    Ok(())
}
