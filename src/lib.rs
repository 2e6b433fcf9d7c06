//! Keel - typed build parameters and convention composition for
//! multi-module project trees.
//!
//! A workspace declares a schema of typed parameters and a set of reusable
//! convention units. Each module requests the units it wants; the resolver
//! applies them (and everything they require) exactly once, in dependency
//! order, deferring capability-gated steps until the capability appears.

pub mod conventions;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

pub use core::{
    manifest::Manifest, module::Module, parameter::ParameterRegistry, workspace::Workspace,
    ResolvedConfiguration,
};

pub use resolver::{ConfigureError, ConfiguredTree};
pub use util::context::GlobalContext;
