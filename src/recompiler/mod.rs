//! Recompile scheduler.
//!
//! Serializes build tool invocations under concurrent trigger pressure:
//! requests arriving while a build runs are coalesced into the next cycle,
//! and every drained request receives exactly one `RecompileResult`.
//!
//! # Module Structure
//!
//! ```text
//! recompiler/
//! ├── queue.rs    # RequestQueue (FIFO buffer, batch draining)
//! ├── worker.rs   # Worker thread state machine
//! ├── process.rs  # BuildProcess guard (output, termination)
//! └── error.rs    # RecompilerError
//! ```
//!
//! Shutdown is signaled by dropping a channel sender, which wakes the worker
//! both in its idle wait and while it waits for the build process.

mod error;
mod process;
mod queue;
mod worker;


pub use error::RecompilerError;
pub use queue::{RecompileRequest, RequestQueue};

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Sender};

use crate::build::{BuildInvocation, strategy_for};
use crate::config::{BuildSectionConfig, RecompilerConfig};
use crate::core::{HookRegistry, termination_hooks};
use crate::orchestration::Orchestration;
use worker::Worker;

/// Time between the graceful termination request and the force kill.
pub const TERMINATION_GRACE: Duration = Duration::from_secs(15);

/// Handle of the running recompiler thread.
///
/// Dropping the handle shuts the recompiler down and waits for it.
pub struct Recompiler {
    queue: RequestQueue,
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Recompiler {
    /// Validate the build configuration and start the recompiler.
    ///
    /// Missing build coordinates abort startup before any thread or process
    /// exists.
    pub fn from_config(
        build: &BuildSectionConfig,
        settings: &RecompilerConfig,
        orchestration: Arc<dyn Orchestration>,
    ) -> Result<Self, RecompilerError> {
        let strategy = strategy_for(build)?;
        crate::debug!("recompiler"; "using orchestration at port {}", orchestration.port());
        Self::launch(RequestQueue::with_warmup(settings.warmup), strategy, orchestration)
    }

    /// Start the worker thread on an existing request buffer.
    pub fn launch(
        queue: RequestQueue,
        strategy: Box<dyn BuildInvocation>,
        orchestration: Arc<dyn Orchestration>,
    ) -> Result<Self, RecompilerError> {
        Self::launch_with(queue, strategy, orchestration, TERMINATION_GRACE, termination_hooks())
    }

    /// Start with an explicit grace period and hook registry for build processes.
    pub(crate) fn launch_with(
        queue: RequestQueue,
        strategy: Box<dyn BuildInvocation>,
        orchestration: Arc<dyn Orchestration>,
        grace: Duration,
        hooks: Arc<HookRegistry>,
    ) -> Result<Self, RecompilerError> {
        let (shutdown_tx, shutdown_rx) = channel::bounded(0);
        let worker = Worker {
            queue: queue.clone(),
            strategy,
            orchestration,
            shutdown: shutdown_rx,
            grace,
            hooks,
        };

        let handle = thread::Builder::new()
            .name("recompiler".into())
            .spawn(move || worker.run())
            .map_err(RecompilerError::Thread)?;

        Ok(Self {
            queue,
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Buffer a request for the next build cycle.
    pub fn enqueue(&self, request: RecompileRequest) {
        self.queue.enqueue(request);
    }

    /// Shared request buffer, for producers outliving this handle's borrow.
    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Interrupt the worker and wait until it exited.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        crate::debug!("recompiler"; "sending close signal");
        drop(self.shutdown.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            crate::log!("error"; "recompiler thread panicked");
        }
    }
}

impl Drop for Recompiler {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}
