//! Workspace - the project tree rooted at `Keel.toml`.
//!
//! Loading a workspace reads the manifest and every module descriptor,
//! declares the parameter schema and registers the convention units. A
//! descriptor that fails to parse is kept on its module and reported when the
//! module is validated. Nothing
//! is configured until [`Workspace::configure`] is called, so parameter
//! overrides can be applied in between.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::conventions::builtin;
use crate::core::convention::ConventionSet;
use crate::core::manifest::{Manifest, ModuleDescriptor, MANIFEST_NAME};
use crate::core::module::{Module, DEFAULT_DESCRIPTOR_EXTENSION};
use crate::core::parameter::ParameterRegistry;
use crate::resolver::{ConfigureError, ConfiguredTree, ConventionGraph, ProjectTreeWalker};

/// A loaded project tree.
#[derive(Debug)]
pub struct Workspace {
    /// Directory containing `Keel.toml`
    root: PathBuf,

    manifest_path: PathBuf,

    name: String,

    /// Modules in declared order
    modules: Vec<Module>,

    params: ParameterRegistry,

    conventions: ConventionSet,
}

impl Workspace {
    /// Load a workspace from a manifest path.
    pub fn new(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut ws = Self::from_manifest(manifest, root)?;
        ws.manifest_path = manifest_path.to_path_buf();
        Ok(ws)
    }

    /// Build a workspace from an already parsed manifest.
    pub fn from_manifest(manifest: Manifest, root: PathBuf) -> Result<Self> {
        let name = manifest.workspace.name.clone().unwrap_or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "workspace".to_string())
        });

        let mut params = ParameterRegistry::new();
        let mut conventions = ConventionSet::new();

        if manifest.workspace.builtins {
            builtin::declare_parameters(&mut params, &name)?;
            builtin::register(&mut conventions)?;
        }

        for (param_name, spec) in &manifest.parameters {
            let param = spec.to_parameter(param_name)?;
            params
                .declare(param)
                .with_context(|| format!("failed to declare parameter `{}`", param_name))?;
        }

        for (id, spec) in manifest.conventions.clone() {
            conventions.register(spec.into_unit(&id))?;
        }

        let extension = manifest
            .workspace
            .descriptor_extension
            .clone()
            .unwrap_or_else(|| DEFAULT_DESCRIPTOR_EXTENSION.to_string());

        let mut modules = Vec::with_capacity(manifest.workspace.members.len());
        for member in &manifest.workspace.members {
            let mut module = Module::new(member.name(), root.join(member.relative_path()))
                .with_descriptor_extension(extension.clone())
                .with_conventions(member.conventions().iter().cloned());

            // parse failures surface from the descriptor check
            match ModuleDescriptor::load_if_present(&module.descriptor_path()) {
                Ok(Some(descriptor)) => {
                    module = module.with_conventions(descriptor.conventions);
                    if let Some(description) = descriptor.description {
                        module = module.with_description(description);
                    }
                    for (key, value) in descriptor.settings {
                        module = module.with_setting(key, value);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!("descriptor of `{}` is malformed: {:#}", module.name(), err);
                    module = module.with_descriptor_error(format!("{:#}", err));
                }
            }

            tracing::debug!(
                "loaded module `{}` with conventions {:?}",
                module.name(),
                module.conventions()
            );
            modules.push(module);
        }

        let ws = Workspace {
            manifest_path: root.join(MANIFEST_NAME),
            root,
            name,
            modules,
            params,
            conventions,
        };
        ws.report_graph_problems();

        Ok(ws)
    }

    /// Warn about unit cycles and missing requirements up front.
    ///
    /// These only become errors for modules that reach them.
    fn report_graph_problems(&self) {
        let graph = self.graph();
        for cycle in graph.cycles() {
            tracing::warn!("convention units form a cycle: {}", cycle.join(", "));
        }
        for (unit, missing) in graph.missing_requirements() {
            tracing::warn!(
                "convention unit `{}` requires unknown unit `{}`",
                unit,
                missing
            );
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name() == name)
    }

    pub fn params(&self) -> &ParameterRegistry {
        &self.params
    }

    /// Mutable access to the registry, for applying overrides before a pass.
    pub fn params_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.params
    }

    pub fn conventions(&self) -> &ConventionSet {
        &self.conventions
    }

    /// The requires graph of every registered unit.
    pub fn graph(&self) -> ConventionGraph {
        ConventionGraph::new(&self.conventions)
    }

    fn walker(&self) -> ProjectTreeWalker<'_> {
        ProjectTreeWalker::new(&self.conventions, &self.params)
    }

    /// Configure every module in declared order.
    pub fn configure(&self) -> Result<ConfiguredTree, ConfigureError> {
        self.walker().configure_all(&self.modules)
    }

    /// Configure a subset of modules, still in declared order.
    pub fn configure_only(&self, names: &[&str]) -> Result<ConfiguredTree, ConfigureError> {
        let selected: Vec<Module> = self
            .modules
            .iter()
            .filter(|m| names.contains(&m.name()))
            .cloned()
            .collect();
        self.walker().configure_all(&selected)
    }

    /// Structural validation of every module.
    pub fn check(&self) -> Result<(), ConfigureError> {
        self.walker().check_all(&self.modules)
    }
}

/// Find `Keel.toml` in a directory.
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    let path = dir.join(MANIFEST_NAME);
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    fn graphma(tmp: &TempDir) -> PathBuf {
        let root = tmp.path();
        write(
            &root.join("Keel.toml"),
            r#"
[workspace]
name = "graphma"
members = [
    "graphma-core",
    { name = "graphma-data", path = "data", conventions = ["java-library-conventions"] },
]

[parameters.jmhIterations]
type = "integer"
default = 5
"#,
        );
        write(
            &root.join("graphma-core/graphma-core.build.toml"),
            r#"
description = "graphma core"
conventions = ["java-library-conventions", "publishing-conventions"]

[settings]
"jmh.iterations" = 5
"#,
        );
        write(&root.join("data/graphma-data.build.toml"), "");
        root.join("Keel.toml")
    }

    #[test]
    fn test_load_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(&graphma(&tmp)).unwrap();

        assert_eq!(ws.name(), "graphma");
        assert_eq!(ws.modules().len(), 2);

        let core = ws.module("graphma-core").unwrap();
        assert_eq!(core.description(), Some("graphma core"));
        assert_eq!(
            core.conventions(),
            ["java-library-conventions", "publishing-conventions"]
        );

        let data = ws.module("graphma-data").unwrap();
        assert_eq!(data.path(), tmp.path().join("data"));
        assert_eq!(data.conventions(), ["java-library-conventions"]);

        assert!(ws.params().get("javaToolchainVersion").is_some());
        assert!(ws.params().get("publishingVersion").is_some());
        assert!(ws.params().get("jmhIterations").is_some());
    }

    #[test]
    fn test_configure_workspace() {
        let tmp = TempDir::new().unwrap();
        let mut ws = Workspace::new(&graphma(&tmp)).unwrap();
        ws.params_mut()
            .set_override_str("javaToolchainVersion", "21")
            .unwrap();
        ws.params_mut()
            .set_override_str("publishingVersion", "1.2.0")
            .unwrap();

        let tree = ws.configure().unwrap();
        let names: Vec<_> = tree.iter().map(|c| c.module.as_str()).collect();
        assert_eq!(names, vec!["graphma-core", "graphma-data"]);

        let core = tree.get("graphma-core").unwrap();
        assert_eq!(core.get_integer("java.toolchain.languageVersion"), Some(21));
        assert_eq!(core.get_str("publishing.version"), Some("1.2.0"));
        assert_eq!(core.get_str("publishing.groupId"), Some("graphma"));
        assert_eq!(core.get_integer("jmh.iterations"), Some(5));
    }

    #[test]
    fn test_configure_only_selected() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(&graphma(&tmp)).unwrap();

        let tree = ws.configure_only(&["graphma-data"]).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get("graphma-core").is_none());
    }

    #[test]
    fn test_missing_descriptor_fails_check() {
        let tmp = TempDir::new().unwrap();
        let manifest = graphma(&tmp);
        std::fs::remove_file(tmp.path().join("data/graphma-data.build.toml")).unwrap();

        let ws = Workspace::new(&manifest).unwrap();
        let err = ws.check().unwrap_err();
        assert_eq!(err.module(), Some("graphma-data"));
        assert!(matches!(err, ConfigureError::StructuralViolation(_)));
    }

    #[test]
    fn test_violations_reported_in_declared_order() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("Keel.toml"),
            "[workspace]\nmembers = [\"a\", \"b\"]\n",
        );
        std::fs::create_dir_all(tmp.path().join("a")).unwrap();
        write(&tmp.path().join("b/b.build.toml"), "conventions = [\"base-conventions\"\n");

        let ws = Workspace::new(&tmp.path().join("Keel.toml")).unwrap();
        assert!(ws.module("b").unwrap().descriptor_error().is_some());

        match ws.check().unwrap_err() {
            ConfigureError::StructuralViolation(v) => {
                assert_eq!(v.module, "a");
                assert!(v.malformed.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }

        write(&tmp.path().join("a/a.build.toml"), "");
        let ws = Workspace::new(&tmp.path().join("Keel.toml")).unwrap();
        match ws.configure().unwrap_err() {
            ConfigureError::StructuralViolation(v) => {
                assert_eq!(v.module, "b");
                assert_eq!(v.check, "descriptor");
                assert!(v.malformed.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_manifest_cannot_redefine_builtin_unit() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("Keel.toml"),
            r#"
[workspace]

[conventions.base-conventions]
requires = []
"#,
        );

        let err = Workspace::new(&tmp.path().join("Keel.toml")).unwrap_err();
        assert!(err.to_string().contains("base-conventions"));
    }

    #[test]
    fn test_builtins_can_be_disabled() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("Keel.toml"),
            r#"
[workspace]
builtins = false

[conventions.base-conventions]
[[conventions.base-conventions.steps]]
set = { "project.group" = "io.graphma" }
"#,
        );

        let ws = Workspace::new(&tmp.path().join("Keel.toml")).unwrap();
        assert_eq!(ws.conventions().len(), 1);
        assert!(ws.params().is_empty());
    }

    #[test]
    fn test_custom_descriptor_extension() {
        let tmp = TempDir::new().unwrap();
        write(
            &tmp.path().join("Keel.toml"),
            "[workspace]\ndescriptor-extension = \"gradle.toml\"\nmembers = [\"core\"]\n",
        );
        write(
            &tmp.path().join("core/core.gradle.toml"),
            "conventions = [\"base-conventions\"]\n",
        );

        let ws = Workspace::new(&tmp.path().join("Keel.toml")).unwrap();
        assert_eq!(ws.module("core").unwrap().conventions(), ["base-conventions"]);
        assert!(ws.check().is_ok());
    }

    #[test]
    fn test_find_manifest() {
        let tmp = TempDir::new().unwrap();
        assert!(find_manifest(tmp.path()).is_none());

        write(&tmp.path().join("Keel.toml"), "[workspace]\n");
        assert_eq!(find_manifest(tmp.path()), Some(tmp.path().join("Keel.toml")));
    }
}
