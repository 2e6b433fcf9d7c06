//! Structural invariants of the project tree.
//!
//! Checks run before any convention is applied. A failure is an authoring
//! defect in the tree, so the walker stops the whole pass on the first one.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::convention::{ConventionSet, ConventionUnit};
use crate::core::module::Module;
use crate::resolver::errors::StructuralViolation;
use crate::util::InternedString;

/// A per-module invariant.
pub trait StructuralCheck: fmt::Debug + Send + Sync {
    /// Short name used in error messages.
    fn name(&self) -> &str;

    fn check(&self, module: &Module) -> Result<(), StructuralViolation>;
}

/// The module's descriptor file (`<name>.<ext>`) must exist in its directory
/// and parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorFileCheck;

impl StructuralCheck for DescriptorFileCheck {
    fn name(&self) -> &str {
        "descriptor"
    }

    fn check(&self, module: &Module) -> Result<(), StructuralViolation> {
        let expected = module.descriptor_path();
        let malformed = if !expected.is_file() {
            None
        } else if let Some(reason) = module.descriptor_error() {
            Some(reason.to_string())
        } else {
            return Ok(());
        };

        Err(StructuralViolation {
            module: module.name().to_string(),
            expected_path: expected,
            check: self.name().to_string(),
            malformed,
        })
    }
}

/// A file, relative to the module directory, that must exist.
#[derive(Debug, Clone)]
pub struct RequiredFile {
    relative: PathBuf,
    name: String,
}

impl RequiredFile {
    pub fn new(relative: impl Into<PathBuf>) -> Self {
        let relative = relative.into();
        let name = format!("require-file:{}", relative.display());
        RequiredFile { relative, name }
    }
}

impl StructuralCheck for RequiredFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, module: &Module) -> Result<(), StructuralViolation> {
        let expected = module.path().join(&self.relative);
        if expected.exists() {
            Ok(())
        } else {
            Err(StructuralViolation {
                module: module.name().to_string(),
                expected_path: expected,
                check: self.name.clone(),
                malformed: None,
            })
        }
    }
}

/// Runs the descriptor check and every check registered by a convention
/// unit the module reaches.
#[derive(Debug, Clone, Copy)]
pub struct StructuralValidator<'a> {
    conventions: &'a ConventionSet,
}

impl<'a> StructuralValidator<'a> {
    pub fn new(conventions: &'a ConventionSet) -> Self {
        StructuralValidator { conventions }
    }

    pub fn validate(&self, module: &Module) -> Result<(), StructuralViolation> {
        DescriptorFileCheck.check(module)?;

        for unit in self.reachable(module) {
            for check in unit.checks() {
                tracing::debug!(
                    "checking `{}` from `{}` on `{}`",
                    check.name(),
                    unit.id(),
                    module.name()
                );
                check.check(module)?;
            }
        }

        Ok(())
    }

    /// Units reachable from the module's requests, in discovery order.
    ///
    /// Unknown ids and cycles are skipped here; the composer reports them.
    fn reachable(&self, module: &Module) -> Vec<Arc<ConventionUnit>> {
        let mut seen: HashSet<InternedString> = HashSet::new();
        let mut out = Vec::new();
        let mut queue: Vec<Arc<ConventionUnit>> = module
            .conventions()
            .iter()
            .filter_map(|id| self.conventions.get(id).cloned())
            .collect();
        queue.reverse();

        while let Some(unit) = queue.pop() {
            if !seen.insert(unit.id()) {
                continue;
            }
            for req in unit.required_units().iter().rev() {
                if let Some(dep) = self.conventions.get(req) {
                    queue.push(dep.clone());
                }
            }
            out.push(unit);
        }

        out
    }
}
