//! Mutable state of one module's configuration pass.

use anyhow::{Context as _, Result};

use crate::core::capability::{Capability, CapabilityProbe};
use crate::core::configuration::ResolvedConfiguration;
use crate::core::convention::Mutation;
use crate::core::module::Module;
use crate::core::parameter::{FromParamValue, ParamValue, ParameterRegistry};
use crate::util::InternedString;

/// A gated mutation waiting on a capability.
#[derive(Debug)]
struct Deferred {
    /// Unit that declared the mutation
    unit: InternedString,
    capability: Capability,
    mutation: Mutation,
}

/// What a mutation sees while a module is configured.
///
/// Owns the staging configuration and the module's capability probe. The
/// parameter registry is only borrowed, so mutations cannot change it.
pub struct ModuleContext<'a> {
    module: &'a Module,
    params: &'a ParameterRegistry,
    config: ResolvedConfiguration,
    probe: CapabilityProbe<Deferred>,
    current_unit: Option<InternedString>,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(module: &'a Module, params: &'a ParameterRegistry) -> Self {
        ModuleContext {
            module,
            params,
            config: ResolvedConfiguration::new(module.name(), module.path()),
            probe: CapabilityProbe::new(),
            current_unit: None,
        }
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    pub fn params(&self) -> &ParameterRegistry {
        self.params
    }

    /// Unit whose step is currently running.
    pub fn current_unit(&self) -> Option<&str> {
        self.current_unit.map(|u| u.as_str())
    }

    /// Resolve a parameter.
    pub fn param(&self, name: &str) -> Result<ParamValue> {
        Ok(self.params.resolve(name)?)
    }

    /// Resolve a parameter as a concrete type, or use `fallback`.
    pub fn param_or<T: FromParamValue>(&self, name: &str, fallback: T) -> T {
        self.params.resolve_as_or(name, fallback)
    }

    /// The configuration as composed so far.
    pub fn config(&self) -> &ResolvedConfiguration {
        &self.config
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.config.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.config.set(key, value);
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<toml::Value>) {
        self.config.append(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<toml::Value> {
        self.config.remove(key)
    }

    pub fn is_present(&self, capability: impl Into<Capability>) -> bool {
        self.probe.is_present(capability.into())
    }

    /// Mark a capability present and run every mutation waiting on it.
    pub fn provide(&mut self, capability: impl Into<Capability>) -> Result<()> {
        let capability = capability.into();
        let due = self.probe.provide(capability);
        if !due.is_empty() {
            tracing::debug!(
                "`{}` is now present on `{}`, running {} deferred step(s)",
                capability,
                self.module.name(),
                due.len()
            );
        }

        for deferred in due {
            self.run_deferred(deferred)?;
        }
        Ok(())
    }

    /// Run `f` once `capability` is present. Runs now if it already is.
    pub fn when_present<F>(&mut self, capability: impl Into<Capability>, f: F) -> Result<()>
    where
        F: Fn(&mut ModuleContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let unit = self
            .current_unit
            .unwrap_or_else(|| InternedString::new(self.module.name()));
        self.defer(unit, capability.into(), Mutation::new(f))
    }

    pub(crate) fn defer(
        &mut self,
        unit: InternedString,
        capability: Capability,
        mutation: Mutation,
    ) -> Result<()> {
        let deferred = Deferred {
            unit,
            capability,
            mutation,
        };

        match self.probe.on_becomes_present(capability, deferred) {
            Some(now) => self.run_deferred(now),
            None => Ok(()),
        }
    }

    fn run_deferred(&mut self, deferred: Deferred) -> Result<()> {
        let previous = self.current_unit.replace(deferred.unit);
        let result = deferred.mutation.run(self).with_context(|| {
            format!(
                "deferred step of `{}` (waiting on `{}`)",
                deferred.unit, deferred.capability
            )
        });
        self.current_unit = previous;
        result
    }

    pub(crate) fn enter_unit(&mut self, unit: InternedString) {
        self.current_unit = Some(unit);
        self.config.applied.push(unit.to_string());
    }

    pub(crate) fn leave_unit(&mut self) {
        self.current_unit = None;
    }

    /// Capabilities that still have deferred steps waiting on them.
    pub(crate) fn awaited(&self) -> Vec<Capability> {
        self.probe.awaited().into_iter().collect()
    }

    pub(crate) fn into_configuration(self) -> ResolvedConfiguration {
        let mut config = self.config;
        config.capabilities = self.probe.present().map(|c| c.to_string()).collect();
        config
    }
}
