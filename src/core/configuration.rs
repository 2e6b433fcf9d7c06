//! Resolved per-module configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// Fully composed configuration of one module.
///
/// Settings are a flat map of dotted keys (`java.toolchain.languageVersion`)
/// to TOML values. The map is ordered so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedConfiguration {
    pub module: String,

    pub path: PathBuf,

    /// Convention units in the order they were applied
    pub applied: Vec<String>,

    /// Capabilities present at the end of the pass, sorted
    pub capabilities: Vec<String>,

    pub settings: BTreeMap<String, toml::Value>,
}

impl ResolvedConfiguration {
    pub fn new(module: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ResolvedConfiguration {
            module: module.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.settings.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_integer())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<toml::Value>> {
        self.get(key).and_then(|v| v.as_array())
    }

    /// Replace a setting.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.settings.insert(key.into(), value.into());
    }

    /// Append to an array setting. A missing key starts a new array; a scalar
    /// becomes the first element.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        let value = value.into();
        let entry = self
            .settings
            .entry(key.into())
            .or_insert_with(|| toml::Value::Array(Vec::new()));

        match entry {
            toml::Value::Array(items) => match value {
                toml::Value::Array(more) => items.extend(more),
                single => items.push(single),
            },
            scalar => {
                let first = std::mem::replace(scalar, toml::Value::Array(Vec::new()));
                let mut items = vec![first];
                match value {
                    toml::Value::Array(more) => items.extend(more),
                    single => items.push(single),
                }
                *scalar = toml::Value::Array(items);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<toml::Value> {
        self.settings.remove(key)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    pub fn was_applied(&self, unit: &str) -> bool {
        self.applied.iter().any(|u| u == unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_typed_get() {
        let mut config = ResolvedConfiguration::new("core", "core");
        config.set("java.toolchain.languageVersion", 17i64);
        config.set("publishing.groupId", "graphma");
        config.set("test.useJUnitPlatform", true);

        assert_eq!(config.get_integer("java.toolchain.languageVersion"), Some(17));
        assert_eq!(config.get_str("publishing.groupId"), Some("graphma"));
        assert_eq!(config.get_bool("test.useJUnitPlatform"), Some(true));
        assert_eq!(config.get_str("java.toolchain.languageVersion"), None);
    }

    #[test]
    fn test_append_builds_arrays() {
        let mut config = ResolvedConfiguration::new("core", "core");
        config.append("repositories", "mavenCentral");
        config.append(
            "repositories",
            toml::Value::Array(vec!["localMavenRepo".into(), "snapshots".into()]),
        );

        let repos: Vec<_> = config
            .get_array("repositories")
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(repos, vec!["mavenCentral", "localMavenRepo", "snapshots"]);
    }

    #[test]
    fn test_append_promotes_scalar() {
        let mut config = ResolvedConfiguration::new("core", "core");
        config.set("compiler.args", "-Xlint:deprecation");
        config.append("compiler.args", "-Werror");

        assert_eq!(config.get_array("compiler.args").map(|a| a.len()), Some(2));
    }
}
