//! High-level operations.
//!
//! This module contains the implementation of Keel commands.

pub mod configure;
pub mod params;

pub use configure::{
    apply_overrides, check_workspace, configure_workspace, load_workspace, parse_override,
    ConfigureOptions,
};
pub use params::{list_parameters, ParameterReport, ValueSource};
