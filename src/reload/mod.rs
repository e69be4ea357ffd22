//! In-place class reload.
//!
//! Resolves freshly compiled class files to classes loaded in the running
//! process, redefines them in one atomic batch and resets static state where
//! the class's static shape changed.
//!
//! # Modules
//!
//! - `engine` - Reload pipeline and outcome
//! - `runtime` - Traits implemented by the host's hot-swap facility
//! - `pool` - Weak loader registry with per-loader class pools
//! - `transform` - Static initializer rename
//! - `diagnose` - Hierarchy divergence warnings
//! - `info` - Structural snapshots of loaded classes
//! - `policy` - Reinitialization decision

mod diagnose;
mod engine;
mod info;
mod policy;
mod pool;
mod runtime;
mod transform;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{ReloadEngine, ReloadError, ReloadOutcome};
pub use info::{ClassInfo, RuntimeInfo, StaticField};
pub use policy::{ReinitPolicy, StaticShapePolicy};
pub use pool::{ClassPool, LoaderRegistry};
pub use runtime::{ClassDefinition, CodeLoader, LoadedClass, LoaderId, RedefinitionError, Runtime};
pub use transform::{REINITIALIZER, transform_for_statics_initialization};
