//! The recompiler thread.
//!
//! ```text
//! Idle ──take_batch()──► Draining ──► Building ──► Reporting ──► Idle
//!   │                                    │
//!   └──── shutdown ──► exit              └── shutdown ──► terminate, report None, exit
//! ```

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;

use super::process::BuildProcess;
use super::queue::{RequestQueue, is_disconnected};
use crate::build::BuildInvocation;
use crate::core::HookRegistry;
use crate::orchestration::{Orchestration, OrchestrationMessage};

pub(super) struct Worker {
    pub queue: RequestQueue,
    pub strategy: Box<dyn BuildInvocation>,
    pub orchestration: Arc<dyn Orchestration>,
    pub shutdown: Receiver<()>,
    pub grace: Duration,
    pub hooks: Arc<HookRegistry>,
}

impl Worker {
    pub fn run(self) {
        crate::debug!("recompiler"; "started ({})", self.strategy.name());

        // A continuous build reports readiness itself once it watches for changes
        if !self.strategy.is_continuous() {
            self.send(OrchestrationMessage::RecompilerReady);
        }

        while let Some(batch) = self.queue.take_batch(&self.shutdown) {
            crate::debug!("recompiler"; "building for {} request(s)", batch.len());
            let exit_code = self.build();

            for request in batch {
                self.send(OrchestrationMessage::RecompileResult {
                    recompile_request_id: request.message_id,
                    exit_code,
                });
            }

            match exit_code {
                Some(0) => crate::debug!("recompiler"; "build finished"),
                Some(code) => crate::log!("recompiler"; "build failed with exit code {}", code),
                None if is_disconnected(&self.shutdown) => break,
                None => crate::log!("recompiler"; "build did not exit cleanly"),
            }
        }

        crate::debug!("recompiler"; "interrupted, shutting down");
    }

    /// Run one build process to completion.
    fn build(&self) -> Option<i32> {
        let cmd = self.strategy.invocation(self.orchestration.port());
        match BuildProcess::spawn(&cmd, Arc::clone(&self.orchestration), &self.hooks) {
            Ok(mut process) => process.wait(&self.shutdown, self.grace),
            Err(e) => {
                crate::log!("error"; "failed to start `{}`: {}", cmd.program_name(), e);
                None
            }
        }
    }

    fn send(&self, message: OrchestrationMessage) {
        if let Err(e) = self.orchestration.send(message) {
            crate::debug!("recompiler"; "dropping message: {}", e);
        }
    }
}
