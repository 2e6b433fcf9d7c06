//! Configuration file support for Keel.
//!
//! Two locations are read:
//! - Global: `~/.keel/config.toml` - user-wide defaults
//! - Project: `.keel/config.toml` next to `Keel.toml`
//!
//! Project config takes precedence over global config. Parameter values set
//! here are the lowest-precedence overrides; environment variables and
//! `-P name=value` win over both files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Keel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parameter values, keyed by parameter name
    pub parameters: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        self.parameters.extend(other.parameters);
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.keel/config.toml)
/// 2. Global config (~/.keel/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path)?);
    }

    config.merge(Config::load_or_default(project_path)?);

    Ok(config)
}

/// Get the global keel config directory (~/.keel).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".keel"))
}

/// Get the project config path (.keel/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".keel").join("config.toml")
}
