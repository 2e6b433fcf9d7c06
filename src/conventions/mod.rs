//! Convention unit sources: built-in units and units declared in `Keel.toml`.

pub mod builtin;
pub mod declarative;

pub use declarative::{interpolate, ConventionSpec, StepSpec};
