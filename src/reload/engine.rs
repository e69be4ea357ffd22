//! Reload engine.
//!
//! ```text
//! changed files ─► resolve ─► materialize ─► transform ─► diagnose
//!                                                           │
//!        outcome ◄─ reinitialize ◄─ diff ◄─ redefine (batch) ◄┘
//! ```
//!
//! Per-file problems exclude only that file. A rejected batch fails the
//! whole request and leaves the engine usable.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::diagnose::diagnose;
use super::info::RuntimeInfo;
use super::policy::{ReinitPolicy, StaticShapePolicy};
use super::pool::LoaderRegistry;
use super::runtime::{ClassDefinition, RedefinitionError, Runtime};
use super::transform::transform_for_statics_initialization;
use crate::classfile::ClassId;
use crate::core::MessageId;
use crate::orchestration::ChangeType;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Redefinition(#[from] RedefinitionError),
}

/// Result of one applied reload request.
#[derive(Debug, Clone)]
pub struct ReloadOutcome {
    pub reload_request_id: MessageId,
    pub definitions: Vec<ClassDefinition>,
    pub previous_runtime: RuntimeInfo,
    pub new_runtime: RuntimeInfo,
    /// Classes whose static state was reset
    pub reinitialized: Vec<ClassId>,
}

pub struct ReloadEngine {
    runtime: Arc<dyn Runtime>,
    registry: LoaderRegistry,
    policy: Box<dyn ReinitPolicy>,
    apply_lock: Mutex<()>,
}

impl ReloadEngine {
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self::with_policy(runtime, StaticShapePolicy)
    }

    pub fn with_policy(runtime: Arc<dyn Runtime>, policy: impl ReinitPolicy + 'static) -> Self {
        Self {
            runtime,
            registry: LoaderRegistry::default(),
            policy: Box::new(policy),
            apply_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Reload every changed class file that is currently loaded.
    pub fn reload(
        &self,
        reload_request_id: MessageId,
        changes: &BTreeMap<PathBuf, ChangeType>,
    ) -> Result<ReloadOutcome, ReloadError> {
        let definitions: Vec<ClassDefinition> = changes
            .iter()
            .filter_map(|(path, change)| self.prepare(path, *change))
            .collect();

        let _guard = self.apply_lock.lock();

        let previous_runtime = self.runtime.snapshot();
        if !definitions.is_empty() {
            self.runtime.redefine(&definitions)?;
            crate::log!("reload"; "redefined {} class(es)", definitions.len());
        }
        let new_runtime = self.runtime.snapshot();

        let reinitialized = self.reinitialize(&definitions, &previous_runtime, &new_runtime);

        Ok(ReloadOutcome {
            reload_request_id,
            definitions,
            previous_runtime,
            new_runtime,
            reinitialized,
        })
    }

    /// Turn one changed file into a definition, or explain why not.
    fn prepare(&self, path: &Path, change: ChangeType) -> Option<ClassDefinition> {
        if change == ChangeType::Removed {
            crate::log!("reload"; "removed: {}", path.display());
            return None;
        }

        if path.extension().is_none_or(|ext| ext != "class") {
            crate::log!("warning"; "{}: {} is not a class", change.label(), path.display());
            return None;
        }

        if !path.is_file() {
            crate::log!("warning"; "{}: {} is not a regular file", change.label(), path.display());
            return None;
        }

        crate::debug!("reload"; "loading: {}", path.display());
        let code = match fs::read(path) {
            Ok(code) => code,
            Err(e) => {
                crate::log!("warning"; "failed to read {}: {}", path.display(), e);
                return None;
            }
        };

        let id = match ClassId::from_bytecode(&code) {
            Ok(id) => id,
            Err(e) => {
                crate::log!("error"; "cannot infer class id for {}: {}", path.display(), e);
                return None;
            }
        };

        let Some(loader) = self.runtime.find_loader(&id) else {
            crate::log!("reload"; "class '{}' is not loaded yet", id.to_fqn());
            return None;
        };

        let Some(loaded) = loader.loaded_class(&id) else {
            crate::log!("reload"; "class '{}' was not loaded yet", id.to_fqn());
            return None;
        };

        let pool = self.registry.pool_for(&loader);
        let mut class = match pool.make_class(&code) {
            Ok(class) => class,
            Err(e) => {
                crate::log!("error"; "failed to parse {}: {}", path.display(), e);
                return None;
            }
        };

        let mut report = format!("reloading class '{}' ({})", id.to_fqn(), change.label());
        match diagnose(&loaded, &class) {
            Ok(warnings) => {
                for warning in warnings {
                    report.push('\n');
                    report.push_str(&warning);
                }
            }
            Err(e) => crate::debug!("reload"; "skipping hierarchy check of {}: {}", id, e),
        }
        crate::log!("reload"; "{}", report);

        if let Err(e) = transform_for_statics_initialization(&mut class) {
            crate::log!("error"; "failed to transform {}: {}", id, e);
            return None;
        }

        Some(ClassDefinition {
            class: loaded,
            bytes: class.to_bytes(),
        })
    }

    fn reinitialize(
        &self,
        definitions: &[ClassDefinition],
        previous: &RuntimeInfo,
        current: &RuntimeInfo,
    ) -> Vec<ClassId> {
        let mut reinitialized = Vec::new();
        for definition in definitions {
            let id = &definition.class.id;
            if !self.policy.requires_reinit(id, previous.get(id), current.get(id)) {
                continue;
            }

            crate::log!("reload"; "reinitializing statics of '{}'", id.to_fqn());
            match self.runtime.reinitialize(&definition.class) {
                Ok(()) => reinitialized.push(id.clone()),
                Err(e) => crate::log!("error"; "failed to reinitialize {}: {:#}", id, e),
            }
        }
        reinitialized
    }
}
