//! `keel check` command

use std::path::Path;

use anyhow::Result;

use keel::ops::{check_workspace, load_workspace};
use keel::GlobalContext;

pub fn execute(ctx: &GlobalContext, manifest_path: Option<&Path>) -> Result<()> {
    let manifest_path = super::locate_manifest(ctx, manifest_path)?;
    let ws = load_workspace(ctx, &manifest_path, &[])?;

    let checked = check_workspace(&ws)?;
    println!("ok: {} module(s) in `{}` are well-formed", checked, ws.name());

    Ok(())
}
