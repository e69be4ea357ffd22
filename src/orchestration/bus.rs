//! In-process orchestration bus.
//!
//! ```text
//! transport --dispatch()--> listeners (recompiler, reload engine)
//! recompiler / agent --send()--> outbound channel --> transport
//! ```
//!
//! The bus owns no thread. Inbound messages are delivered synchronously on
//! the thread calling [`Bus::dispatch`]; outbound messages are queued on an
//! unbounded channel drained by the transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use super::message::OrchestrationMessage;

/// Errors returned when talking to the orchestration bus.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestrationError {
    #[error("orchestration bus is closed")]
    Closed,
}

/// Outbound side of the orchestration client.
pub trait Orchestration: Send + Sync {
    /// Queue a message for delivery; never blocks.
    fn send(&self, message: OrchestrationMessage) -> Result<(), OrchestrationError>;

    /// Port of the orchestration server, forwarded to the build tool.
    fn port(&self) -> u16;
}

type Listener = Arc<dyn Fn(&OrchestrationMessage) + Send + Sync>;
type CloseHook = Box<dyn FnOnce() + Send>;

/// In-process orchestration bus.
pub struct Bus {
    port: u16,
    outbound: Mutex<Option<Sender<OrchestrationMessage>>>,
    listeners: RwLock<Vec<Listener>>,
    close_hooks: Mutex<Vec<CloseHook>>,
    closing: AtomicBool,
}

impl Bus {
    /// Create a bus and the receiver of its outbound messages.
    pub fn new(port: u16) -> (Arc<Self>, Receiver<OrchestrationMessage>) {
        let (tx, rx) = channel::unbounded();
        let bus = Self {
            port,
            outbound: Mutex::new(Some(tx)),
            listeners: RwLock::new(Vec::new()),
            close_hooks: Mutex::new(Vec::new()),
            closing: AtomicBool::new(false),
        };
        (Arc::new(bus), rx)
    }

    /// Invoke `listener` for every inbound message.
    pub fn invoke_when_received(
        &self,
        listener: impl Fn(&OrchestrationMessage) + Send + Sync + 'static,
    ) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Invoke `hook` once when the bus closes (immediately if already closed).
    pub fn invoke_when_closed(&self, hook: impl FnOnce() + Send + 'static) {
        if self.is_closed() {
            hook();
            return;
        }
        self.close_hooks.lock().push(Box::new(hook));
    }

    /// Deliver an inbound message to all listeners on the calling thread.
    pub fn dispatch(&self, message: &OrchestrationMessage) {
        if self.is_closed() {
            crate::debug!("bus"; "dropping inbound message after close");
            return;
        }
        // Snapshot so listeners may register further listeners
        let listeners: Vec<Listener> = self.listeners.read().clone();
        for listener in listeners {
            listener(message);
        }
    }

    /// Close the bus: run close hooks, then stop outbound delivery.
    ///
    /// Hooks may still send while they run (e.g. final recompile results).
    pub fn close(&self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        crate::debug!("bus"; "closing");

        let hooks = std::mem::take(&mut *self.close_hooks.lock());
        for hook in hooks {
            hook();
        }

        self.outbound.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }
}

impl Orchestration for Bus {
    fn send(&self, message: OrchestrationMessage) -> Result<(), OrchestrationError> {
        let outbound = self.outbound.lock();
        let tx = outbound.as_ref().ok_or(OrchestrationError::Closed)?;
        tx.send(message).map_err(|_| OrchestrationError::Closed)
    }

    fn port(&self) -> u16 {
        self.port
    }
}
