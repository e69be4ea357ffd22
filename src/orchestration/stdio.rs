//! JSON-lines transport over stdin/stdout.
//!
//! One message per line in both directions. Outbound messages are written by
//! a dedicated thread; inbound lines are read on the calling thread and
//! dispatched to the bus until `ShutdownRequest` or end of input.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;
use parking_lot::Mutex;

use super::bus::Bus;
use super::message::OrchestrationMessage;

/// Default bound on waiting for queued outbound messages at exit.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

const FLUSH_POLL: Duration = Duration::from_millis(10);

// =============================================================================
// Outbound
// =============================================================================

/// Handle of the outbound writer thread.
pub struct OutboundWriter {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OutboundWriter {
    /// Wait up to `timeout` for the writer to flush every queued message.
    ///
    /// The bus must be closed first, otherwise the writer never finishes.
    /// Returns `false` if the writer is still busy or panicked. Concurrent
    /// callers wait for the first one.
    pub fn finish(&self, timeout: Duration) -> bool {
        let mut slot = self.handle.lock();
        let Some(handle) = slot.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                crate::log!("warning"; "orchestration writer did not flush within {:?}", timeout);
                *slot = Some(handle);
                return false;
            }
            thread::sleep(FLUSH_POLL);
        }

        if handle.join().is_err() {
            crate::log!("error"; "orchestration writer panicked");
            return false;
        }
        true
    }
}

/// Spawn the writer thread draining outbound messages into `out`.
///
/// The thread exits once the bus closed and every queued message was written.
pub fn spawn_writer<W>(outbound: Receiver<OrchestrationMessage>, mut out: W) -> io::Result<OutboundWriter>
where
    W: Write + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("orchestration-writer".into())
        .spawn(move || {
            for message in outbound {
                let written = writeln!(out, "{}", message.to_json()).and_then(|()| out.flush());
                if let Err(e) = written {
                    crate::log!("error"; "failed to write orchestration message: {}", e);
                    break;
                }
            }
        })?;

    Ok(OutboundWriter {
        handle: Mutex::new(Some(handle)),
    })
}

// =============================================================================
// Inbound
// =============================================================================

/// Read messages from `input` and dispatch them until shutdown.
///
/// Closes the bus on `ShutdownRequest`, end of input, or a read error.
/// Malformed lines, including ones that are not valid UTF-8, are reported
/// and skipped.
pub fn pump<R: BufRead>(bus: &Arc<Bus>, mut input: R) {
    let mut buf = Vec::new();
    while !crate::core::is_shutdown() {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                crate::log!("error"; "failed to read orchestration input: {}", e);
                break;
            }
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                crate::log!("warning"; "ignoring malformed message: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        match OrchestrationMessage::from_json(line) {
            Ok(OrchestrationMessage::ShutdownRequest) => {
                crate::debug!("bus"; "shutdown requested");
                break;
            }
            Ok(message) => bus.dispatch(&message),
            Err(e) => crate::log!("warning"; "ignoring malformed message: {}", e),
        }
    }

    bus.close();
}
