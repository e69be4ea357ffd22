//! Host runtime hot-swap facility.
//!
//! The engine never touches running code directly: it asks the [`Runtime`]
//! which loader holds a class, hands it a batch of new definitions and asks
//! it to reset static state. Embedders implement these traits on top of
//! their instrumentation interface.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::info::RuntimeInfo;
use crate::classfile::ClassId;

/// Identity of a code loader, stable for the loader's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(pub u64);

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

/// A class currently loaded in the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedClass {
    pub id: ClassId,
    pub loader: LoaderId,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
}

/// Replacement bytecode for one loaded class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDefinition {
    pub class: LoadedClass,
    pub bytes: Vec<u8>,
}

/// The hot-swap facility rejected a redefinition batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("redefinition rejected: {reason}")]
pub struct RedefinitionError {
    pub reason: String,
}

impl RedefinitionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A namespace of loaded classes.
pub trait CodeLoader: Send + Sync {
    fn id(&self) -> LoaderId;

    fn name(&self) -> &str;

    /// The loaded class of this identity, if this loader defined it.
    fn loaded_class(&self, id: &ClassId) -> Option<LoadedClass>;
}

/// The running process, as seen by the reload engine.
pub trait Runtime: Send + Sync {
    /// Loader holding a loaded class of this identity.
    fn find_loader(&self, id: &ClassId) -> Option<Arc<dyn CodeLoader>>;

    /// Replace all definitions at once, or none of them.
    fn redefine(&self, definitions: &[ClassDefinition]) -> Result<(), RedefinitionError>;

    /// Structural metadata of every loaded class.
    fn snapshot(&self) -> RuntimeInfo;

    /// Reset the static fields of `class` and run its reinitializer.
    fn reinitialize(&self, class: &LoadedClass) -> anyhow::Result<()>;
}
