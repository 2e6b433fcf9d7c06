//! `Keel.toml` and module descriptor parsing.
//!
//! The root manifest declares the module set, the typed parameters and any
//! project-specific convention units. Each module directory holds a
//! descriptor named `<module>.<descriptor-extension>` with the module's own
//! convention requests and settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::conventions::ConventionSpec;
use crate::core::parameter::{ParamType, ParamValue, Parameter};

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Keel.toml";

/// The parsed `Keel.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub workspace: WorkspaceSection,

    /// Parameter declarations, keyed by name
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,

    /// Project-specific convention units, keyed by id
    #[serde(default)]
    pub conventions: BTreeMap<String, ConventionSpec>,
}

/// The `[workspace]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub name: Option<String>,

    /// Extension of module descriptor files (default `build.toml`)
    #[serde(default)]
    pub descriptor_extension: Option<String>,

    /// Register the built-in conventions and parameters
    #[serde(default = "default_true")]
    pub builtins: bool,

    #[serde(default)]
    pub members: Vec<MemberSpec>,
}

fn default_true() -> bool {
    true
}

/// A workspace member: either a bare name or a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MemberSpec {
    Name(String),
    Detailed(DetailedMember),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedMember {
    pub name: String,

    /// Directory relative to the workspace root (defaults to the name)
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub conventions: Vec<String>,
}

impl MemberSpec {
    pub fn name(&self) -> &str {
        match self {
            MemberSpec::Name(name) => name,
            MemberSpec::Detailed(d) => &d.name,
        }
    }

    /// Directory relative to the workspace root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            MemberSpec::Name(name) => PathBuf::from(name),
            MemberSpec::Detailed(d) => d.path.clone().unwrap_or_else(|| PathBuf::from(&d.name)),
        }
    }

    pub fn conventions(&self) -> &[String] {
        match self {
            MemberSpec::Name(_) => &[],
            MemberSpec::Detailed(d) => &d.conventions,
        }
    }
}

/// A `[parameters.<name>]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,

    #[serde(default)]
    pub default: Option<toml::Value>,

    #[serde(default)]
    pub description: String,
}

impl ParameterSpec {
    /// Turn the table into a declaration.
    pub fn to_parameter(&self, name: &str) -> Result<Parameter> {
        let mut param =
            Parameter::new(name, self.param_type).with_description(self.description.clone());

        if let Some(default) = &self.default {
            let Some(value) = ParamValue::from_toml(default) else {
                bail!(
                    "default of parameter `{}` must be a {}, found {}",
                    name,
                    self.param_type,
                    default.type_str()
                );
            };
            param = param.with_default(value);
        }

        Ok(param)
    }
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(contents)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for member in &self.workspace.members {
            let name = member.name();
            if name.is_empty() {
                bail!("workspace member names must not be empty");
            }
            if !seen.insert(name) {
                bail!("workspace member `{}` is declared twice", name);
            }
        }

        if let Some(ext) = &self.workspace.descriptor_extension {
            if ext.is_empty() || ext.starts_with('.') {
                bail!(
                    "descriptor-extension `{}` must be non-empty and must not start with `.`",
                    ext
                );
            }
        }

        Ok(())
    }
}

/// A module descriptor, `<module>.<descriptor-extension>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDescriptor {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub conventions: Vec<String>,

    #[serde(default)]
    pub settings: BTreeMap<String, toml::Value>,
}

impl ModuleDescriptor {
    /// Load a descriptor if the file exists.
    ///
    /// A missing descriptor is not an error here; the structural validator
    /// reports it when the tree is configured.
    pub fn load_if_present(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read module descriptor: {}", path.display()))?;
        let descriptor = toml::from_str(&contents)
            .with_context(|| format!("failed to parse module descriptor: {}", path.display()))?;
        Ok(Some(descriptor))
    }
}
