//! Configuration resolution.
//!
//! The resolver is pure and deterministic: the only I/O is the structural
//! validator checking that required files exist.

pub mod compose;
pub mod context;
pub mod errors;
pub mod graph;
pub mod validate;
pub mod walk;

pub use compose::Composer;
pub use context::ModuleContext;
pub use errors::{ConfigureError, StructuralViolation};
pub use graph::ConventionGraph;
pub use validate::{DescriptorFileCheck, RequiredFile, StructuralCheck, StructuralValidator};
pub use walk::{ConfiguredTree, ProjectTreeWalker};
