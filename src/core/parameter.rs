//! Typed build parameters.
//!
//! The registry is declared once at the workspace root. External overrides
//! (config files, environment, `-P name=value`) are applied before any module
//! is configured; afterwards the registry is only ever borrowed immutably.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::errors::ConfigureError;

/// Prefix of environment variables that override parameter values.
pub const ENV_PREFIX: &str = "KEEL_PARAM_";

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Integer,
    String,
    Boolean,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Integer => "integer",
            ParamType::String => "string",
            ParamType::Boolean => "boolean",
        }
    }

    /// Parse a raw (env or CLI) string as a value of this type.
    pub fn parse_value(&self, raw: &str) -> Option<ParamValue> {
        match self {
            ParamType::Integer => raw.trim().parse().ok().map(ParamValue::Integer),
            ParamType::Boolean => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(ParamValue::Boolean(true)),
                "false" | "no" | "0" => Some(ParamValue::Boolean(false)),
                _ => None,
            },
            ParamType::String => Some(ParamValue::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Integer(_) => ParamType::Integer,
            ParamValue::String(_) => ParamType::String,
            ParamValue::Boolean(_) => ParamType::Boolean,
        }
    }

    /// Convert into a TOML value for storage in a resolved configuration.
    pub fn to_toml(&self) -> toml::Value {
        match self {
            ParamValue::Integer(i) => toml::Value::Integer(*i),
            ParamValue::String(s) => toml::Value::String(s.clone()),
            ParamValue::Boolean(b) => toml::Value::Boolean(*b),
        }
    }

    /// Convert a scalar TOML value. Tables, arrays and datetimes have no
    /// parameter representation.
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::Integer(i) => Some(ParamValue::Integer(*i)),
            toml::Value::String(s) => Some(ParamValue::String(s.clone())),
            toml::Value::Boolean(b) => Some(ParamValue::Boolean(*b)),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(i) => write!(f, "{}", i),
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

/// Rust types a parameter value can be read as.
pub trait FromParamValue: Sized {
    const TYPE: ParamType;

    fn from_param(value: ParamValue) -> Option<Self>;
}

impl FromParamValue for i64 {
    const TYPE: ParamType = ParamType::Integer;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl FromParamValue for bool {
    const TYPE: ParamType = ParamType::Boolean;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FromParamValue for String {
    const TYPE: ParamType = ParamType::String;

    fn from_param(value: ParamValue) -> Option<Self> {
        match value {
            ParamValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Declaration of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParamType,
    pub default: Option<ParamValue>,
    pub description: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Parameter {
            name: name.into(),
            param_type,
            default: None,
            description: String::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Schema and value store for build parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    /// Declarations in declaration order
    parameters: Vec<Parameter>,

    /// Name -> index into `parameters`
    index: HashMap<String, usize>,

    /// Externally supplied values
    overrides: HashMap<String, ParamValue>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter.
    pub fn declare(&mut self, parameter: Parameter) -> Result<(), ConfigureError> {
        if self.index.contains_key(&parameter.name) {
            return Err(ConfigureError::DuplicateParameter {
                name: parameter.name,
            });
        }

        if let Some(default) = &parameter.default {
            if default.param_type() != parameter.param_type {
                return Err(ConfigureError::ParameterTypeMismatch {
                    name: parameter.name,
                    expected: parameter.param_type,
                    found: default.param_type(),
                });
            }
        }

        tracing::debug!("declared parameter `{}` ({})", parameter.name, parameter.param_type);
        self.index.insert(parameter.name.clone(), self.parameters.len());
        self.parameters.push(parameter);
        Ok(())
    }

    /// Look up a declaration.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.parameters[i])
    }

    /// Iterate declarations in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Supply an explicit value for a declared parameter.
    pub fn set_override(
        &mut self,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), ConfigureError> {
        let value = value.into();
        let param = self
            .get(name)
            .ok_or_else(|| ConfigureError::UnknownParameter {
                name: name.to_string(),
            })?;

        if value.param_type() != param.param_type {
            return Err(ConfigureError::ParameterTypeMismatch {
                name: name.to_string(),
                expected: param.param_type,
                found: value.param_type(),
            });
        }

        self.overrides.insert(name.to_string(), value);
        Ok(())
    }

    /// Supply a raw string value, parsed according to the declared type.
    pub fn set_override_str(&mut self, name: &str, raw: &str) -> Result<(), ConfigureError> {
        let param = self
            .get(name)
            .ok_or_else(|| ConfigureError::UnknownParameter {
                name: name.to_string(),
            })?;

        let value =
            param
                .param_type
                .parse_value(raw)
                .ok_or_else(|| ConfigureError::InvalidParameterValue {
                    name: name.to_string(),
                    expected: param.param_type,
                    value: raw.to_string(),
                })?;

        self.overrides.insert(name.to_string(), value);
        Ok(())
    }

    /// Check whether an explicit value was supplied.
    pub fn is_overridden(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Resolve a parameter: explicit value, else declared default.
    pub fn resolve(&self, name: &str) -> Result<ParamValue, ConfigureError> {
        if let Some(value) = self.overrides.get(name) {
            return Ok(value.clone());
        }

        let param = self
            .get(name)
            .ok_or_else(|| ConfigureError::UnknownParameter {
                name: name.to_string(),
            })?;

        param
            .default
            .clone()
            .ok_or_else(|| ConfigureError::UnresolvedParameter {
                name: name.to_string(),
            })
    }

    /// Resolve a parameter, falling back to `fallback` when it has no value.
    pub fn resolve_or(&self, name: &str, fallback: impl Into<ParamValue>) -> ParamValue {
        self.resolve(name).unwrap_or_else(|_| fallback.into())
    }

    /// Resolve a parameter as a concrete Rust type.
    pub fn resolve_as<T: FromParamValue>(&self, name: &str) -> Result<T, ConfigureError> {
        let value = self.resolve(name)?;
        let found = value.param_type();
        T::from_param(value).ok_or_else(|| ConfigureError::ParameterTypeMismatch {
            name: name.to_string(),
            expected: T::TYPE,
            found,
        })
    }

    /// Resolve a parameter as a concrete Rust type, or return `fallback`.
    pub fn resolve_as_or<T: FromParamValue>(&self, name: &str, fallback: T) -> T {
        self.resolve_as(name).unwrap_or(fallback)
    }

    /// Apply overrides from environment variables (`KEEL_PARAM_<NAME>`).
    ///
    /// `lookup` is usually `std::env::var`; tests pass a closure over a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let names: Vec<String> = self.parameters.iter().map(|p| p.name.clone()).collect();
        for name in names {
            if let Some(raw) = lookup(&env_var_name(&name)) {
                tracing::debug!("parameter `{}` set from environment", name);
                self.set_override_str(&name, &raw)?;
            }
        }
        Ok(())
    }
}

/// Environment variable consulted for a parameter.
///
/// `javaToolchainVersion` becomes `KEEL_PARAM_JAVA_TOOLCHAIN_VERSION`.
pub fn env_var_name(name: &str) -> String {
    let mut out = String::from(ENV_PREFIX);
    let mut prev_lower = false;
    for c in name.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ParameterRegistry {
        let mut reg = ParameterRegistry::new();
        reg.declare(
            Parameter::new("javaToolchainVersion", ParamType::Integer)
                .with_description("Java toolchain version used for compiling code"),
        )
        .unwrap();
        reg.declare(Parameter::new("group", ParamType::String).with_default("graphma"))
            .unwrap();
        reg.declare(Parameter::new("signing", ParamType::Boolean).with_default(false))
            .unwrap();
        reg
    }

    #[test]
    fn test_default_without_override() {
        let reg = registry();
        assert_eq!(reg.resolve("group").unwrap(), ParamValue::from("graphma"));
        assert_eq!(reg.resolve("signing").unwrap(), ParamValue::Boolean(false));
    }

    #[test]
    fn test_override_wins_over_default() {
        let mut reg = registry();
        reg.set_override("group", "org.graphma").unwrap();
        reg.set_override_str("signing", "true").unwrap();

        assert_eq!(reg.resolve("group").unwrap(), ParamValue::from("org.graphma"));
        assert!(reg.resolve_as::<bool>("signing").unwrap());
        assert!(reg.is_overridden("group"));
    }

    #[test]
    fn test_unresolved_without_default() {
        let reg = registry();
        assert!(matches!(
            reg.resolve("javaToolchainVersion"),
            Err(ConfigureError::UnresolvedParameter { name }) if name == "javaToolchainVersion"
        ));
        assert_eq!(
            reg.resolve_or("javaToolchainVersion", 17_i64),
            ParamValue::Integer(17)
        );
        assert_eq!(reg.resolve_as_or("javaToolchainVersion", 17i64), 17);
    }

    #[test]
    fn test_resolve_or_ignores_fallback_when_set() {
        let mut reg = registry();
        reg.set_override("javaToolchainVersion", 21_i64).unwrap();
        assert_eq!(reg.resolve_as_or("javaToolchainVersion", 17i64), 21);
    }

    #[test]
    fn test_resolve_or_undeclared_name() {
        let reg = registry();
        assert_eq!(reg.resolve_or("nope", "x"), ParamValue::from("x"));
        assert!(matches!(
            reg.resolve("nope"),
            Err(ConfigureError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut reg = registry();
        let err = reg
            .declare(Parameter::new("group", ParamType::String))
            .unwrap_err();
        assert!(matches!(err, ConfigureError::DuplicateParameter { name } if name == "group"));
    }

    #[test]
    fn test_default_type_must_match() {
        let mut reg = ParameterRegistry::new();
        let err = reg
            .declare(Parameter::new("jobs", ParamType::Integer).with_default("four"))
            .unwrap_err();
        assert!(matches!(err, ConfigureError::ParameterTypeMismatch { .. }));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_override_validation() {
        let mut reg = registry();
        assert!(matches!(
            reg.set_override_str("javaToolchainVersion", "seventeen"),
            Err(ConfigureError::InvalidParameterValue { .. })
        ));
        assert!(matches!(
            reg.set_override("missing", 1_i64),
            Err(ConfigureError::UnknownParameter { .. })
        ));
        assert!(matches!(
            reg.set_override("group", true),
            Err(ConfigureError::ParameterTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_apply_env() {
        let mut reg = registry();
        reg.apply_env(|key| {
            (key == "KEEL_PARAM_JAVA_TOOLCHAIN_VERSION").then(|| "21".to_string())
        })
        .unwrap();
        assert_eq!(reg.resolve_as::<i64>("javaToolchainVersion").unwrap(), 21);
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(
            env_var_name("javaToolchainVersion"),
            "KEEL_PARAM_JAVA_TOOLCHAIN_VERSION"
        );
        assert_eq!(env_var_name("group"), "KEEL_PARAM_GROUP");
        assert_eq!(env_var_name("max-heap"), "KEEL_PARAM_MAX_HEAP");
    }

    #[test]
    fn test_declaration_order_preserved() {
        let reg = registry();
        let names: Vec<_> = reg.parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["javaToolchainVersion", "group", "signing"]);
    }
}
