//! Walks the module set: validate, then compose, in declared order.

use serde::Serialize;

use crate::core::configuration::ResolvedConfiguration;
use crate::core::convention::ConventionSet;
use crate::core::module::Module;
use crate::core::parameter::ParameterRegistry;
use crate::resolver::compose::Composer;
use crate::resolver::errors::ConfigureError;
use crate::resolver::validate::StructuralValidator;

/// Resolved configurations of every module, in declared order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfiguredTree {
    modules: Vec<ResolvedConfiguration>,
}

impl ConfiguredTree {
    pub fn get(&self, module: &str) -> Option<&ResolvedConfiguration> {
        self.modules.iter().find(|c| c.module == module)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedConfiguration> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl IntoIterator for ConfiguredTree {
    type Item = ResolvedConfiguration;
    type IntoIter = std::vec::IntoIter<ResolvedConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.into_iter()
    }
}

/// One-shot configuration pass over a project tree.
#[derive(Debug, Clone, Copy)]
pub struct ProjectTreeWalker<'a> {
    validator: StructuralValidator<'a>,
    composer: Composer<'a>,
}

impl<'a> ProjectTreeWalker<'a> {
    pub fn new(conventions: &'a ConventionSet, params: &'a ParameterRegistry) -> Self {
        ProjectTreeWalker {
            validator: StructuralValidator::new(conventions),
            composer: Composer::new(conventions, params),
        }
    }

    /// Configure every module.
    ///
    /// Stops at the first error. Nothing is returned for modules configured
    /// before the failure, and modules after it are never touched.
    pub fn configure_all(&self, modules: &[Module]) -> Result<ConfiguredTree, ConfigureError> {
        let mut tree = ConfiguredTree::default();

        for module in modules {
            tracing::debug!("configuring module `{}`", module.name());
            self.validator.validate(module)?;
            tree.modules.push(self.composer.compose(module)?);
        }

        tracing::debug!("configured {} module(s)", tree.len());
        Ok(tree)
    }

    /// Run structural validation only.
    pub fn check_all(&self, modules: &[Module]) -> Result<(), ConfigureError> {
        for module in modules {
            self.validator.validate(module)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::core::convention::ConventionUnit;
    use tempfile::TempDir;

    fn module(root: &Path, name: &str, with_descriptor: bool) -> Module {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        if with_descriptor {
            std::fs::write(dir.join(format!("{}.build.toml", name)), "").unwrap();
        }
        Module::new(name, dir).with_convention("record")
    }

    /// Unit recording the name of every module it configures.
    fn recording_set(seen: Arc<Mutex<Vec<String>>>) -> ConventionSet {
        let mut set = ConventionSet::new();
        set.register(ConventionUnit::new("record").apply(move |ctx| {
            seen.lock().unwrap().push(ctx.module().name().to_string());
            Ok(())
        }))
        .unwrap();
        set
    }

    #[test]
    fn test_configures_in_declared_order() {
        let tmp = TempDir::new().unwrap();
        let modules = vec![
            module(tmp.path(), "graphma-data", true),
            module(tmp.path(), "graphma-core", true),
        ];

        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = recording_set(seen.clone());
        let params = ParameterRegistry::new();

        let tree = ProjectTreeWalker::new(&set, &params)
            .configure_all(&modules)
            .unwrap();

        let names: Vec<_> = tree.iter().map(|c| c.module.as_str()).collect();
        assert_eq!(names, vec!["graphma-data", "graphma-core"]);
        assert_eq!(*seen.lock().unwrap(), vec!["graphma-data", "graphma-core"]);
        assert!(tree.get("graphma-core").is_some());
    }

    #[test]
    fn test_halts_at_first_structural_violation() {
        let tmp = TempDir::new().unwrap();
        let modules = vec![
            module(tmp.path(), "graphma-core", true),
            module(tmp.path(), "graphma-playground", false),
            module(tmp.path(), "graphma-benchmarks", true),
        ];

        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = recording_set(seen.clone());
        let params = ParameterRegistry::new();

        let err = ProjectTreeWalker::new(&set, &params)
            .configure_all(&modules)
            .unwrap_err();

        match err {
            ConfigureError::StructuralViolation(v) => {
                assert_eq!(v.module, "graphma-playground");
                assert_eq!(
                    v.expected_path,
                    tmp.path()
                        .join("graphma-playground")
                        .join("graphma-playground.build.toml")
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*seen.lock().unwrap(), vec!["graphma-core"]);
    }

    #[test]
    fn test_compose_error_aborts_pass() {
        let tmp = TempDir::new().unwrap();
        let modules = vec![
            module(tmp.path(), "a", true),
            module(tmp.path(), "b", true).with_convention("ghost"),
            module(tmp.path(), "c", true),
        ];

        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = recording_set(seen.clone());
        let params = ParameterRegistry::new();

        let err = ProjectTreeWalker::new(&set, &params)
            .configure_all(&modules)
            .unwrap_err();

        assert!(matches!(err, ConfigureError::UnknownConventionUnit { ref unit, .. } if unit == "ghost"));
        assert_eq!(err.module(), Some("b"));
        assert_eq!(*seen.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_check_all_does_not_compose() {
        let tmp = TempDir::new().unwrap();
        let modules = vec![module(tmp.path(), "a", true)];

        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = recording_set(seen.clone());
        let params = ParameterRegistry::new();

        ProjectTreeWalker::new(&set, &params)
            .check_all(&modules)
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }
}
