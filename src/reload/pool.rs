//! Loader-scoped class pools.
//!
//! Each code loader gets one [`ClassPool`], created on first use. The
//! registry only holds the loader weakly: once the runtime drops a loader,
//! its pool is discarded on the next lookup.

use std::sync::{Arc, Weak};

use dashmap::DashMap;

use super::runtime::{CodeLoader, LoaderId};
use crate::classfile::{ClassFile, ClassFileError};

/// Materialization context of one loader.
///
/// Classes are parsed fresh on every request; the pool keeps no copies.
#[derive(Debug)]
pub struct ClassPool {
    loader_name: String,
}

impl ClassPool {
    fn new(loader_name: &str) -> Self {
        Self {
            loader_name: loader_name.to_string(),
        }
    }

    /// Parse `bytes` into a class of this loader.
    pub fn make_class(&self, bytes: &[u8]) -> Result<ClassFile, ClassFileError> {
        let class = ClassFile::parse(bytes)?;
        crate::debug!("reload"; "materialized {} in {}", class.name()?, self.loader_name);
        Ok(class)
    }
}

struct Entry {
    loader: Weak<dyn CodeLoader>,
    pool: Arc<ClassPool>,
}

/// Weak loader → pool association shared by all reloads.
#[derive(Default)]
pub struct LoaderRegistry {
    entries: DashMap<LoaderId, Entry>,
}

impl LoaderRegistry {
    /// Pool of `loader`, created lazily.
    pub fn pool_for(&self, loader: &Arc<dyn CodeLoader>) -> Arc<ClassPool> {
        self.prune();

        let entry = self.entries.entry(loader.id()).or_insert_with(|| {
            crate::debug!("reload"; "creating class pool for {}", loader.name());
            Entry {
                loader: Arc::downgrade(loader),
                pool: Arc::new(ClassPool::new(loader.name())),
            }
        });
        Arc::clone(&entry.pool)
    }

    /// Drop pools of loaders that no longer exist.
    pub fn prune(&self) {
        self.entries.retain(|id, entry| {
            let alive = entry.loader.strong_count() > 0;
            if !alive {
                crate::debug!("reload"; "discarding class pool of {}", id);
            }
            alive
        });
    }

    /// Number of live pools.
    pub fn len(&self) -> usize {
        self.prune();
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
