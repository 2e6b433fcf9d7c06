//! Modules of a project tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default extension of per-module descriptor files.
pub const DEFAULT_DESCRIPTOR_EXTENSION: &str = "build.toml";

/// A module declared in the workspace manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,

    /// Module directory
    path: PathBuf,

    /// Requested convention unit ids, in request order
    conventions: Vec<String>,

    /// Extension used to derive the descriptor file name
    descriptor_extension: String,

    /// Module-specific settings, applied after all conventions
    settings: BTreeMap<String, toml::Value>,

    description: Option<String>,

    /// Why the descriptor file could not be read, if it exists but is broken
    descriptor_error: Option<String>,
}

impl Module {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Module {
            name: name.into(),
            path: path.into(),
            conventions: Vec::new(),
            descriptor_extension: DEFAULT_DESCRIPTOR_EXTENSION.to_string(),
            settings: BTreeMap::new(),
            description: None,
            descriptor_error: None,
        }
    }

    /// Request a convention unit. Repeated requests are ignored.
    pub fn with_convention(mut self, id: impl Into<String>) -> Self {
        self.request(id);
        self
    }

    pub fn with_conventions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            self.request(id);
        }
        self
    }

    pub fn with_descriptor_extension(mut self, ext: impl Into<String>) -> Self {
        self.descriptor_extension = ext.into();
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Record that the descriptor exists but could not be parsed.
    pub fn with_descriptor_error(mut self, error: impl Into<String>) -> Self {
        self.descriptor_error = Some(error.into());
        self
    }

    fn request(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.conventions.contains(&id) {
            self.conventions.push(id);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn conventions(&self) -> &[String] {
        &self.conventions
    }

    pub fn settings(&self) -> &BTreeMap<String, toml::Value> {
        &self.settings
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn descriptor_error(&self) -> Option<&str> {
        self.descriptor_error.as_deref()
    }

    /// Descriptor file name, `<name>.<extension>`.
    pub fn descriptor_file_name(&self) -> String {
        format!("{}.{}", self.name, self.descriptor_extension)
    }

    /// Where the descriptor file is expected.
    pub fn descriptor_path(&self) -> PathBuf {
        self.path.join(self.descriptor_file_name())
    }
}
