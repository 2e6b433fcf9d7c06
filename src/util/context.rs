//! Global context for Keel operations.
//!
//! Provides centralized access to the working directory, the user-wide keel
//! directory and configuration files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::workspace::find_manifest;
use crate::util::config::{self, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global keel data (~/.keel/)
    home: Option<PathBuf>,
}

impl GlobalContext {
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        Ok(GlobalContext {
            cwd,
            home: config::global_config_dir(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a different keel home directory.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// The keel home directory (~/.keel/), if a home directory is known.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Merged global and project configuration for a workspace root.
    pub fn load_config(&self, workspace_root: &Path) -> Result<Config> {
        config::load_config(
            self.config_path().as_deref(),
            &config::project_config_path(workspace_root),
        )
    }

    /// Find `Keel.toml` starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Option<PathBuf> {
        self.cwd.ancestors().find_map(find_manifest)
    }

    /// Resolve an explicit `--manifest-path`, or search for one.
    pub fn manifest_path(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(path) if path.is_dir() => find_manifest(&self.cwd.join(path)),
            Some(path) => Some(self.cwd.join(path)),
            None => self.find_manifest(),
        }
    }
}
