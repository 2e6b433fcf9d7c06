//! Convention units declared in `Keel.toml`.
//!
//! ```toml
//! [conventions.my-conventions]
//! requires = ["java-library-conventions"]
//! require-files = ["README.md"]
//!
//! [[conventions.my-conventions.steps]]
//! when = "java"
//! set = { "java.toolchain.languageVersion" = "${javaToolchainVersion:-17}" }
//! append = { "javaCompile.args" = "-Werror" }
//! provide = ["my-capability"]
//! ```
//!
//! String values may reference parameters. A value that is exactly
//! `${name}` or `${name:-fallback}` takes the parameter's type; references
//! embedded in a longer string are interpolated as text.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::core::convention::{ConventionUnit, Mutation, MutationStep};
use crate::core::parameter::{ParamValue, ParameterRegistry};
use crate::resolver::context::ModuleContext;
use crate::resolver::errors::ConfigureError;
use crate::resolver::validate::RequiredFile;

/// A `[conventions.<id>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConventionSpec {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub requires: Vec<String>,

    /// Files (relative to the module) every module using this unit must have
    #[serde(default)]
    pub require_files: Vec<PathBuf>,

    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

/// One `[[conventions.<id>.steps]]` entry.
///
/// Actions run in the order `set`, `append`, `remove`, `provide`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Capability gating the step
    #[serde(default)]
    pub when: Option<String>,

    #[serde(default)]
    pub set: BTreeMap<String, toml::Value>,

    #[serde(default)]
    pub append: BTreeMap<String, toml::Value>,

    #[serde(default)]
    pub remove: Vec<String>,

    #[serde(default)]
    pub provide: Vec<String>,
}

impl ConventionSpec {
    /// Build the convention unit described by this table.
    pub fn into_unit(self, id: &str) -> ConventionUnit {
        let mut unit = ConventionUnit::new(id);
        if let Some(description) = self.description {
            unit = unit.with_description(description);
        }
        for req in &self.requires {
            unit = unit.requires(req);
        }
        for file in self.require_files {
            unit = unit.check(RequiredFile::new(file));
        }
        for step in self.steps {
            unit = unit.step(step.into_step());
        }
        unit
    }
}

impl StepSpec {
    fn into_step(self) -> MutationStep {
        let when = self.when.clone();
        let spec = Arc::new(self);
        let mutation = Mutation::new(move |ctx| spec.run(ctx));

        match when {
            Some(capability) => MutationStep::WhenPresent {
                capability: capability.into(),
                mutation,
            },
            None => MutationStep::Apply(mutation),
        }
    }

    fn run(&self, ctx: &mut ModuleContext<'_>) -> anyhow::Result<()> {
        for (key, value) in &self.set {
            let value = interpolate(value, ctx.params())?;
            ctx.set(key.clone(), value);
        }
        for (key, value) in &self.append {
            let value = interpolate(value, ctx.params())?;
            ctx.append(key.clone(), value);
        }
        for key in &self.remove {
            ctx.remove(key);
        }
        for capability in &self.provide {
            ctx.provide(capability.as_str())?;
        }
        Ok(())
    }
}

/// Substitute parameter references in a value.
pub fn interpolate(
    value: &toml::Value,
    params: &ParameterRegistry,
) -> Result<toml::Value, ConfigureError> {
    match value {
        toml::Value::String(s) => interpolate_str(s, params),
        toml::Value::Array(items) => items
            .iter()
            .map(|v| interpolate(v, params))
            .collect::<Result<Vec<_>, _>>()
            .map(toml::Value::Array),
        toml::Value::Table(table) => {
            let mut out = toml::map::Map::new();
            for (k, v) in table {
                out.insert(k.clone(), interpolate(v, params)?);
            }
            Ok(toml::Value::Table(out))
        }
        other => Ok(other.clone()),
    }
}

fn interpolate_str(s: &str, params: &ParameterRegistry) -> Result<toml::Value, ConfigureError> {
    if let Some(inner) = whole_reference(s) {
        return lookup(inner, params).map(|v| v.to_toml());
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let inner = &rest[start + 2..start + 2 + len];
        out.push_str(&lookup(inner, params)?.to_string());
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);

    Ok(toml::Value::String(out))
}

/// `Some(inner)` if `s` is exactly one `${...}` reference.
fn whole_reference(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        None
    } else {
        Some(inner)
    }
}

fn lookup(reference: &str, params: &ParameterRegistry) -> Result<ParamValue, ConfigureError> {
    let (name, fallback) = match reference.split_once(":-") {
        Some((name, fallback)) => (name.trim(), Some(fallback)),
        None => (reference.trim(), None),
    };

    let Some(raw) = fallback else {
        return params.resolve(name);
    };

    if let Ok(value) = params.resolve(name) {
        return Ok(value);
    }

    match params.get(name) {
        Some(param) => param.param_type.parse_value(raw).ok_or_else(|| {
            ConfigureError::InvalidParameterValue {
                name: name.to_string(),
                expected: param.param_type,
                value: raw.to_string(),
            }
        }),
        None => Ok(infer_literal(raw)),
    }
}

fn infer_literal(raw: &str) -> ParamValue {
    if let Ok(i) = raw.parse::<i64>() {
        ParamValue::Integer(i)
    } else if let Ok(b) = raw.parse::<bool>() {
        ParamValue::Boolean(b)
    } else {
        ParamValue::String(raw.to_string())
    }
}
