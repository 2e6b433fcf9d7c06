//! Convention units - reusable bundles of configuration mutations.
//!
//! Units are immutable once registered and shared by reference between all
//! modules that request them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use crate::core::capability::Capability;
use crate::resolver::context::ModuleContext;
use crate::resolver::errors::ConfigureError;
use crate::resolver::validate::StructuralCheck;
use crate::util::InternedString;

type MutationFn = dyn Fn(&mut ModuleContext<'_>) -> Result<()> + Send + Sync;

/// A configuration mutation applied to one module.
#[derive(Clone)]
pub struct Mutation(Arc<MutationFn>);

impl Mutation {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut ModuleContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Mutation(Arc::new(f))
    }

    /// Run the mutation against a module.
    pub fn run(&self, ctx: &mut ModuleContext<'_>) -> Result<()> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mutation(..)")
    }
}

/// One step of a convention unit.
#[derive(Debug, Clone)]
pub enum MutationStep {
    /// Applied immediately, in declaration order.
    Apply(Mutation),

    /// Applied once, the first time `capability` is present on the module.
    WhenPresent {
        capability: Capability,
        mutation: Mutation,
    },
}

/// A named, composable bundle of configuration.
#[derive(Clone)]
pub struct ConventionUnit {
    id: InternedString,
    description: String,
    requires: Vec<InternedString>,
    steps: Vec<MutationStep>,
    checks: Vec<Arc<dyn StructuralCheck>>,
}

impl ConventionUnit {
    pub fn new(id: impl AsRef<str>) -> Self {
        ConventionUnit {
            id: InternedString::new(id),
            description: String::new(),
            requires: Vec::new(),
            steps: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Require another unit to be fully applied before this one.
    pub fn requires(mut self, id: impl AsRef<str>) -> Self {
        let id = InternedString::new(id);
        if !self.requires.contains(&id) {
            self.requires.push(id);
        }
        self
    }

    /// Append an unconditional mutation.
    pub fn apply<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ModuleContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.steps.push(MutationStep::Apply(Mutation::new(f)));
        self
    }

    /// Append a mutation gated on a capability.
    pub fn when_present<F>(mut self, capability: impl Into<Capability>, f: F) -> Self
    where
        F: Fn(&mut ModuleContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.steps.push(MutationStep::WhenPresent {
            capability: capability.into(),
            mutation: Mutation::new(f),
        });
        self
    }

    /// Append a prebuilt step.
    pub fn step(mut self, step: MutationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Register an additional structural check for modules using this unit.
    pub fn check(mut self, check: impl StructuralCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    pub fn id(&self) -> InternedString {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required_units(&self) -> &[InternedString] {
        &self.requires
    }

    pub fn steps(&self) -> &[MutationStep] {
        &self.steps
    }

    pub fn checks(&self) -> &[Arc<dyn StructuralCheck>] {
        &self.checks
    }
}

impl fmt::Debug for ConventionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionUnit")
            .field("id", &self.id)
            .field("requires", &self.requires)
            .field("steps", &self.steps.len())
            .field("checks", &self.checks)
            .finish()
    }
}

/// All convention units known to a workspace.
#[derive(Debug, Clone, Default)]
pub struct ConventionSet {
    units: HashMap<InternedString, Arc<ConventionUnit>>,

    /// Registration order, for listing
    order: Vec<InternedString>,
}

impl ConventionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit. Ids are unique within a set.
    pub fn register(&mut self, unit: ConventionUnit) -> Result<(), ConfigureError> {
        let id = unit.id();
        if self.units.contains_key(&id) {
            return Err(ConfigureError::DuplicateConventionUnit {
                unit: id.to_string(),
            });
        }

        self.units.insert(id, Arc::new(unit));
        self.order.push(id);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ConventionUnit>> {
        self.units.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Units in registration order.
    pub fn units(&self) -> impl Iterator<Item = &Arc<ConventionUnit>> + '_ {
        self.order.iter().filter_map(|id| self.units.get(id))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
