//! Core data structures for Keel.
//!
//! - Typed build parameters and their registry
//! - Capabilities and the deliver-once capability probe
//! - Convention units and the set they are registered in
//! - Modules, manifests and the workspace that ties them together

pub mod capability;
pub mod configuration;
pub mod convention;
pub mod manifest;
pub mod module;
pub mod parameter;
pub mod workspace;

pub use capability::{Capability, CapabilityProbe};
pub use configuration::ResolvedConfiguration;
pub use convention::{ConventionSet, ConventionUnit, Mutation, MutationStep};
pub use manifest::{Manifest, ModuleDescriptor, MANIFEST_NAME};
pub use module::Module;
pub use parameter::{ParamType, ParamValue, Parameter, ParameterRegistry};
pub use workspace::{find_manifest, Workspace};
