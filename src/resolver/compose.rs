//! Convention composition for a single module.
//!
//! The plan (transitive `requires` closure in dependency order) is computed
//! before any mutation runs, so unknown units and cycles never leave a
//! partially applied configuration behind. Mutations then run against a
//! staging context that is only turned into a `ResolvedConfiguration` when
//! every step succeeded.

use std::collections::HashSet;
use std::sync::Arc;

use crate::conventions::declarative::interpolate;
use crate::core::configuration::ResolvedConfiguration;
use crate::core::convention::{ConventionSet, ConventionUnit, MutationStep};
use crate::core::module::Module;
use crate::core::parameter::ParameterRegistry;
use crate::resolver::context::ModuleContext;
use crate::resolver::errors::ConfigureError;
use crate::util::InternedString;

/// Applies convention units to modules.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    conventions: &'a ConventionSet,
    params: &'a ParameterRegistry,
}

impl<'a> Composer<'a> {
    pub fn new(conventions: &'a ConventionSet, params: &'a ParameterRegistry) -> Self {
        Composer {
            conventions,
            params,
        }
    }

    /// Units to apply for a module, dependencies first.
    ///
    /// Each reachable unit appears once. Requests and `requires` are visited
    /// in declaration order, which makes the plan deterministic.
    pub fn plan(&self, module: &Module) -> Result<Vec<Arc<ConventionUnit>>, ConfigureError> {
        let mut planner = Planner {
            conventions: self.conventions,
            module: module.name(),
            stack: Vec::new(),
            done: HashSet::new(),
            order: Vec::new(),
        };

        for id in module.conventions() {
            planner.visit(id)?;
        }

        Ok(planner.order)
    }

    /// Compose a module's configuration.
    pub fn compose(&self, module: &Module) -> Result<ResolvedConfiguration, ConfigureError> {
        let plan = self.plan(module)?;
        tracing::debug!(
            "composing `{}`: {}",
            module.name(),
            plan.iter()
                .map(|u| u.id().as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut ctx = ModuleContext::new(module, self.params);

        for unit in &plan {
            apply_unit(&mut ctx, unit).map_err(|source| ConfigureError::MutationFailure {
                module: module.name().to_string(),
                unit: unit.id().to_string(),
                source,
            })?;
        }

        apply_module_settings(&mut ctx, module).map_err(|source| {
            ConfigureError::MutationFailure {
                module: module.name().to_string(),
                unit: module.descriptor_file_name(),
                source,
            }
        })?;

        let waiting = ctx.awaited();
        if !waiting.is_empty() {
            tracing::debug!(
                "`{}`: deferred steps never ran, capabilities absent: {}",
                module.name(),
                waiting
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        Ok(ctx.into_configuration())
    }
}

fn apply_unit(ctx: &mut ModuleContext<'_>, unit: &ConventionUnit) -> anyhow::Result<()> {
    ctx.enter_unit(unit.id());

    for step in unit.steps() {
        match step {
            MutationStep::Apply(mutation) => mutation.run(ctx)?,
            MutationStep::WhenPresent {
                capability,
                mutation,
            } => ctx.defer(unit.id(), *capability, mutation.clone())?,
        }
    }

    ctx.leave_unit();
    Ok(())
}

/// The module's own settings act as its body and apply last.
fn apply_module_settings(ctx: &mut ModuleContext<'_>, module: &Module) -> anyhow::Result<()> {
    for (key, value) in module.settings() {
        let value = interpolate(value, ctx.params())?;
        ctx.set(key.clone(), value);
    }
    Ok(())
}

/// Depth-first walk over `requires`.
struct Planner<'a> {
    conventions: &'a ConventionSet,
    module: &'a str,

    /// Units currently being visited, outermost first
    stack: Vec<InternedString>,

    done: HashSet<InternedString>,
    order: Vec<Arc<ConventionUnit>>,
}

impl Planner<'_> {
    fn visit(&mut self, id: &str) -> Result<(), ConfigureError> {
        let unit = self
            .conventions
            .get(id)
            .cloned()
            .ok_or_else(|| ConfigureError::UnknownConventionUnit {
                module: self.module.to_string(),
                unit: id.to_string(),
            })?;
        let uid = unit.id();

        if self.done.contains(&uid) {
            return Ok(());
        }

        if let Some(pos) = self.stack.iter().position(|s| *s == uid) {
            return Err(ConfigureError::CyclicConvention {
                module: self.module.to_string(),
                cycle: self.stack[pos..].iter().map(|s| s.to_string()).collect(),
            });
        }

        self.stack.push(uid);
        for req in unit.required_units() {
            self.visit(req)?;
        }
        self.stack.pop();

        self.done.insert(uid);
        self.order.push(unit);
        Ok(())
    }
}
