//! In-memory runtime for reload tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use super::info::{ClassInfo, RuntimeInfo};
use super::runtime::{ClassDefinition, CodeLoader, LoadedClass, LoaderId, RedefinitionError, Runtime};
use crate::classfile::ClassId;

#[derive(Default)]
struct State {
    /// Current bytecode per loaded class
    classes: FxHashMap<ClassId, Vec<u8>>,
    /// Number of times each class ran its static initializer
    initializations: FxHashMap<ClassId, u32>,
}

struct FakeLoader {
    id: LoaderId,
    state: Arc<Mutex<State>>,
}

impl CodeLoader for FakeLoader {
    fn id(&self) -> LoaderId {
        self.id
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn loaded_class(&self, id: &ClassId) -> Option<LoadedClass> {
        let state = self.state.lock();
        let info = ClassInfo::analyze(state.classes.get(id)?).ok()?;
        Some(LoadedClass {
            id: info.id,
            loader: self.id,
            superclass: info.superclass,
            interfaces: info.interfaces,
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeRuntime {
    state: Arc<Mutex<State>>,
    loader: Mutex<Option<Arc<FakeLoader>>>,
    reject: AtomicBool,
    redefining: AtomicBool,
    overlapped: AtomicBool,
    redefine_calls: AtomicUsize,
    failing_reinit: Mutex<FxHashSet<ClassId>>,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        let runtime = Self::default();
        *runtime.loader.lock() = Some(Arc::new(FakeLoader {
            id: LoaderId(1),
            state: Arc::clone(&runtime.state),
        }));
        Arc::new(runtime)
    }

    /// Load and initialize a class.
    pub fn load(&self, bytes: Vec<u8>) -> ClassId {
        let id = ClassId::from_bytecode(&bytes).unwrap();
        let mut state = self.state.lock();
        state.classes.insert(id.clone(), bytes);
        state.initializations.insert(id.clone(), 1);
        id
    }

    pub fn bytes(&self, id: &ClassId) -> Vec<u8> {
        self.state.lock().classes[id].clone()
    }

    pub fn initializations(&self, id: &ClassId) -> u32 {
        self.state.lock().initializations[id]
    }

    pub fn redefine_calls(&self) -> usize {
        self.redefine_calls.load(Ordering::SeqCst)
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn fail_reinit(&self, id: &ClassId) {
        self.failing_reinit.lock().insert(id.clone());
    }

    /// Drop the only strong reference to the loader.
    pub fn unload_loader(&self) {
        self.loader.lock().take();
    }
}

impl Runtime for FakeRuntime {
    fn find_loader(&self, id: &ClassId) -> Option<Arc<dyn CodeLoader>> {
        if !self.state.lock().classes.contains_key(id) {
            return None;
        }
        let loader = self.loader.lock().clone()?;
        Some(loader as Arc<dyn CodeLoader>)
    }

    fn redefine(&self, definitions: &[ClassDefinition]) -> Result<(), RedefinitionError> {
        if self.redefining.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.redefine_calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window for overlapping callers
        thread::sleep(Duration::from_millis(5));

        let result = if self.reject.load(Ordering::SeqCst) {
            Err(RedefinitionError::new("schema change not implemented"))
        } else {
            let mut state = self.state.lock();
            for definition in definitions {
                state
                    .classes
                    .insert(definition.class.id.clone(), definition.bytes.clone());
            }
            Ok(())
        };

        self.redefining.store(false, Ordering::SeqCst);
        result
    }

    fn snapshot(&self) -> RuntimeInfo {
        let state = self.state.lock();
        state
            .classes
            .values()
            .filter_map(|bytes| ClassInfo::analyze(bytes).ok())
            .collect()
    }

    fn reinitialize(&self, class: &LoadedClass) -> anyhow::Result<()> {
        if self.failing_reinit.lock().contains(&class.id) {
            anyhow::bail!("initializer threw");
        }
        *self
            .state
            .lock()
            .initializations
            .entry(class.id.clone())
            .or_default() += 1;
        Ok(())
    }
}
