//! Configuration error types and diagnostics.

use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::parameter::ParamType;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised during a configuration pass.
///
/// Every variant is fatal to the pass; nothing is retried.
#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("parameter `{name}` is already declared")]
    DuplicateParameter { name: String },

    #[error("parameter `{name}` has no default and no value was supplied")]
    UnresolvedParameter { name: String },

    #[error("parameter `{name}` is not declared")]
    UnknownParameter { name: String },

    #[error("invalid value `{value}` for {expected} parameter `{name}`")]
    InvalidParameterValue {
        name: String,
        expected: ParamType,
        value: String,
    },

    #[error("parameter `{name}` is declared as {expected} but was given {found}")]
    ParameterTypeMismatch {
        name: String,
        expected: ParamType,
        found: ParamType,
    },

    #[error("convention unit `{unit}` is already registered")]
    DuplicateConventionUnit { unit: String },

    #[error("module `{module}` requests unknown convention unit `{unit}`")]
    UnknownConventionUnit { module: String, unit: String },

    #[error("cyclic convention units in module `{module}`: {}", cycle.join(" -> "))]
    CyclicConvention { module: String, cycle: Vec<String> },

    #[error(transparent)]
    StructuralViolation(#[from] StructuralViolation),

    #[error("convention unit `{unit}` failed while configuring module `{module}`: {source:#}")]
    MutationFailure {
        module: String,
        unit: String,
        #[source]
        source: anyhow::Error,
    },
}

/// A module breaks a structural invariant of the project tree.
#[derive(Debug, Clone, Error, MietteDiagnostic)]
#[error("module `{module}` violates `{check}`: {}", describe_problem(.expected_path, .malformed.as_deref()))]
#[diagnostic(
    code(keel::structure::violation),
    help("every module must provide the files its conventions require")
)]
pub struct StructuralViolation {
    pub module: String,
    pub expected_path: PathBuf,
    /// Name of the check that failed (e.g. `descriptor`).
    pub check: String,
    /// Parse error, when the file exists but cannot be read.
    pub malformed: Option<String>,
}

fn describe_problem(path: &Path, malformed: Option<&str>) -> String {
    match malformed {
        Some(reason) => format!("{} is malformed: {}", path.display(), reason),
        None => format!("{} does not exist", path.display()),
    }
}

impl ConfigureError {
    /// Name of the module the error is attributed to, if any.
    pub fn module(&self) -> Option<&str> {
        match self {
            ConfigureError::UnknownConventionUnit { module, .. }
            | ConfigureError::CyclicConvention { module, .. }
            | ConfigureError::MutationFailure { module, .. } => Some(module),
            ConfigureError::StructuralViolation(v) => Some(&v.module),
            _ => None,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ConfigureError::DuplicateParameter { name } => {
                Diagnostic::error(format!("parameter `{}` is declared twice", name))
                    .with_suggestion("Remove one of the declarations from Keel.toml")
            }

            ConfigureError::UnresolvedParameter { name } => {
                Diagnostic::error(format!("parameter `{}` has no value", name))
                    .with_context("the parameter is declared without a default")
                    .with_suggestion(format!("Pass `-P {}=<value>`", name))
                    .with_suggestion(format!(
                        "Set `{}` in the environment",
                        crate::core::parameter::env_var_name(name)
                    ))
            }

            ConfigureError::UnknownParameter { name } => {
                Diagnostic::error(format!("parameter `{}` is not declared", name))
                    .with_suggestion(suggestions::LIST_PARAMETERS)
            }

            ConfigureError::InvalidParameterValue {
                name,
                expected,
                value,
            } => Diagnostic::error(format!("invalid value for parameter `{}`", name))
                .with_context(format!("expected {}, got `{}`", expected, value)),

            ConfigureError::ParameterTypeMismatch {
                name,
                expected,
                found,
            } => Diagnostic::error(format!("type mismatch for parameter `{}`", name))
                .with_context(format!("declared as {}, given {}", expected, found)),

            ConfigureError::DuplicateConventionUnit { unit } => {
                Diagnostic::error(format!("convention unit `{}` is defined twice", unit))
                    .with_context("built-in units cannot be redefined in Keel.toml")
            }

            ConfigureError::UnknownConventionUnit { module, unit } => Diagnostic::error(
                format!("unknown convention unit `{}`", unit),
            )
            .with_context(format!("requested by module `{}`", module))
            .with_suggestion(suggestions::LIST_CONVENTIONS),

            ConfigureError::CyclicConvention { module, cycle } => {
                let mut path = cycle.clone();
                if let Some(first) = cycle.first() {
                    path.push(first.clone());
                }
                Diagnostic::error("cycle detected in convention units")
                    .with_context(format!("cycle: {}", path.join(" -> ")))
                    .with_context(format!("while configuring module `{}`", module))
                    .with_suggestion(
                        "Break the cycle by removing one of the `requires` entries",
                    )
            }

            ConfigureError::StructuralViolation(v) => {
                let diag = Diagnostic::error(format!("module `{}` is malformed", v.module))
                    .with_location(&v.expected_path);
                match &v.malformed {
                    Some(reason) => diag
                        .with_context(format!("check `{}` failed: file could not be parsed", v.check))
                        .with_context(reason.clone())
                        .with_suggestion(format!("Fix the syntax of {}", v.expected_path.display())),
                    None => diag
                        .with_context(format!("check `{}` failed: file does not exist", v.check))
                        .with_suggestion(format!("Create {}", v.expected_path.display())),
                }
            }

            ConfigureError::MutationFailure {
                module,
                unit,
                source,
            } => Diagnostic::error(format!("convention unit `{}` failed", unit))
                .with_context(format!("while configuring module `{}`", module))
                .with_context(format!("{:#}", source)),
        }
    }
}
