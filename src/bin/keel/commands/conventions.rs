//! `keel conventions` command

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::ConventionsArgs;
use keel::ops::load_workspace;
use keel::util::diagnostic::suggestions;
use keel::GlobalContext;

pub fn execute(
    args: ConventionsArgs,
    ctx: &GlobalContext,
    manifest_path: Option<&Path>,
) -> Result<()> {
    let manifest_path = super::locate_manifest(ctx, manifest_path)?;
    let ws = load_workspace(ctx, &manifest_path, &[])?;
    let graph = ws.graph();

    if let Some(unit) = args.unit {
        if !ws.conventions().contains(&unit) {
            bail!(
                "unknown convention unit `{}`\n{}",
                unit,
                suggestions::LIST_CONVENTIONS
            );
        }
        for line in graph.render_tree(&unit) {
            println!("{}", line);
        }
        let dependents = graph.dependents(&unit);
        if !dependents.is_empty() {
            println!();
            println!("required by: {}", dependents.join(", "));
        }
        return Ok(());
    }

    for unit in ws.conventions().units() {
        let requires: Vec<&str> = unit.required_units().iter().map(|r| r.as_str()).collect();
        if requires.is_empty() {
            println!("{}", unit.id());
        } else {
            println!("{} -> {}", unit.id(), requires.join(", "));
        }
        if !unit.description().is_empty() {
            println!("    {}", unit.description());
        }
    }

    for cycle in graph.cycles() {
        println!();
        println!("cycle: {}", cycle.join(", "));
    }

    Ok(())
}
