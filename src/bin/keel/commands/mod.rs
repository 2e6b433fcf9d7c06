//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use keel::ops::parse_override;
use keel::util::diagnostic::suggestions;
use keel::GlobalContext;

pub mod check;
pub mod completions;
pub mod conventions;
pub mod params;
pub mod resolve;

/// Locate `Keel.toml` from `--manifest-path` or the working directory.
fn locate_manifest(ctx: &GlobalContext, explicit: Option<&Path>) -> Result<PathBuf> {
    let path = ctx.manifest_path(explicit).ok_or_else(|| {
        anyhow!(
            "could not find Keel.toml in {} or any parent directory\n{}",
            ctx.cwd().display(),
            suggestions::NO_MANIFEST
        )
    })?;

    if !path.is_file() {
        return Err(anyhow!(
            "manifest not found: {}\n{}",
            path.display(),
            suggestions::NO_MANIFEST
        ));
    }

    Ok(path)
}

fn parse_overrides(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter().map(|s| parse_override(s)).collect()
}
