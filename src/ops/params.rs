//! Parameter listing.

use serde::Serialize;

use crate::core::parameter::{ParamType, ParamValue, ParameterRegistry};

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    /// Supplied by config, environment or command line
    Override,
    Default,
    /// No value; resolving the parameter fails
    Unset,
}

/// One row of `keel params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterReport {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub value: Option<ParamValue>,
    pub source: ValueSource,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Report every declared parameter with its resolved value, in declaration order.
pub fn list_parameters(params: &ParameterRegistry) -> Vec<ParameterReport> {
    params
        .parameters()
        .map(|param| {
            let value = params.resolve(&param.name).ok();
            let source = if params.is_overridden(&param.name) {
                ValueSource::Override
            } else if value.is_some() {
                ValueSource::Default
            } else {
                ValueSource::Unset
            };

            ParameterReport {
                name: param.name.clone(),
                param_type: param.param_type,
                value,
                source,
                description: param.description.clone(),
            }
        })
        .collect()
}
