//! Process-wide shutdown state.
//!
//! Two pieces of global state:
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received, bus closed)
//! - `TERMINATION_HOOKS`: Cleanup actions run by the host's top-level shutdown
//!   handler, so child processes die with the agent even on abnormal exit.

use std::sync::{Arc, LazyLock, OnceLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Shutdown has been requested
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Callback invoked once by the Ctrl+C handler after hooks ran
static ON_SHUTDOWN: OnceLock<Box<dyn Fn() + Send + Sync>> = OnceLock::new();

type Hook = Box<dyn FnOnce() + Send>;

/// Registered termination hooks of this process
static TERMINATION_HOOKS: LazyLock<Arc<HookRegistry>> =
    LazyLock::new(|| Arc::new(HookRegistry::default()));

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler and panic hook. Call once at program start.
///
/// Both paths run every registered termination hook. The Ctrl+C path then
/// invokes the callback registered with [`on_shutdown`].
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        run_termination_hooks();
        default_panic(info);
    }));

    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
        crate::log!("agent"; "shutting down...");
        run_termination_hooks();

        match ON_SHUTDOWN.get() {
            Some(callback) => callback(),
            // Nothing to shut down gracefully yet
            None => std::process::exit(130),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the graceful shutdown callback (e.g. closing the orchestration bus).
pub fn on_shutdown(callback: impl Fn() + Send + Sync + 'static) {
    let _ = ON_SHUTDOWN.set(Box::new(callback));
}

/// Mark shutdown as requested without going through the signal handler.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

// =============================================================================
// Termination hooks
// =============================================================================

/// Cleanup actions keyed by registration id.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Mutex<FxHashMap<u64, Hook>>,
    next_id: AtomicU64,
}

impl HookRegistry {
    /// Register a cleanup action; the returned handle deregisters it on drop.
    pub fn register(self: &Arc<Self>, hook: impl FnOnce() + Send + 'static) -> TerminationHook {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.hooks.lock().insert(id, Box::new(hook));
        TerminationHook {
            id,
            registry: Arc::clone(self),
        }
    }

    /// Run and remove every registered hook.
    pub fn run_all(&self) {
        // Take hooks out first: a hook must never run under the registry lock
        let hooks: Vec<Hook> = {
            let mut registry = self.hooks.lock();
            registry.drain().map(|(_, hook)| hook).collect()
        };
        for hook in hooks {
            hook();
        }
    }

    /// Number of hooks currently registered.
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration handle of a termination hook.
///
/// Dropping the handle deregisters the hook without running it.
#[must_use = "dropping the handle deregisters the hook"]
pub struct TerminationHook {
    id: u64,
    registry: Arc<HookRegistry>,
}

impl TerminationHook {
    /// Check whether the hook is still pending.
    pub fn is_registered(&self) -> bool {
        self.registry.hooks.lock().contains_key(&self.id)
    }
}

impl Drop for TerminationHook {
    fn drop(&mut self) {
        self.registry.hooks.lock().remove(&self.id);
    }
}

/// Registry of cleanup actions run if the host shuts down abnormally.
pub fn termination_hooks() -> Arc<HookRegistry> {
    Arc::clone(&TERMINATION_HOOKS)
}

/// Run and remove every registered termination hook of this process.
pub fn run_termination_hooks() {
    TERMINATION_HOOKS.run_all();
}

// =============================================================================
// Tests
// =============================================================================
