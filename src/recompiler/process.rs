//! Lifecycle of one build process.
//!
//! A [`BuildProcess`] owns the spawned child for exactly one build cycle:
//! - a termination hook kills the child if the host shuts down abnormally
//! - a detached reader thread forwards merged output lines as `LogMessage`
//! - dropping the guard kills a child that is still running

use std::io::{self, BufRead, BufReader, PipeReader};
use std::process::Child;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};
use parking_lot::Mutex;

use crate::core::{HookRegistry, TerminationHook};
use crate::orchestration::{Orchestration, OrchestrationMessage};
use crate::utils::exec::{Cmd, strip_ansi};

/// Interval between exit status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(super) struct BuildProcess {
    child: Arc<Mutex<Child>>,
    pid: u32,
    _hook: TerminationHook,
}

impl BuildProcess {
    /// Spawn `cmd`, register its kill hook in `hooks` and start forwarding its output.
    pub fn spawn(
        cmd: &Cmd,
        orchestration: Arc<dyn Orchestration>,
        hooks: &Arc<HookRegistry>,
    ) -> io::Result<Self> {
        let (child, output) = cmd.spawn_merged()?;
        let pid = child.id();
        let child = Arc::new(Mutex::new(child));

        let hook = {
            let child = Arc::clone(&child);
            hooks.register(move || {
                crate::debug!("recompiler"; "killing build process {} (shutdown)", pid);
                let _ = child.lock().kill();
            })
        };

        let process = Self {
            child,
            pid,
            _hook: hook,
        };
        // On failure `process` is dropped here, which kills the child
        spawn_output_reader(output, orchestration)?;

        crate::debug!("recompiler"; "started build process {}: {}", pid, cmd);
        Ok(process)
    }

    /// Wait for the process to exit.
    ///
    /// Returns the exit code, or `None` when the process was killed by a
    /// signal or interrupted through `shutdown`.
    pub fn wait(&mut self, shutdown: &Receiver<()>, grace: Duration) -> Option<i32> {
        loop {
            match self.child.lock().try_wait() {
                Ok(Some(status)) => return status.code(),
                Ok(None) => {}
                Err(e) => {
                    crate::log!("error"; "failed to wait for build process {}: {}", self.pid, e);
                    return None;
                }
            }

            match shutdown.recv_timeout(POLL_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    self.terminate(grace);
                    return None;
                }
            }
        }
    }

    /// Ask the process to stop, force kill once `grace` elapsed.
    fn terminate(&mut self, grace: Duration) {
        crate::debug!("recompiler"; "terminating build process {}", self.pid);
        self.signal_terminate();

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !matches!(self.child.lock().try_wait(), Ok(None)) {
                return;
            }
            thread::sleep(POLL_INTERVAL);
        }

        crate::debug!("recompiler"; "force killing build process {} (interrupt)", self.pid);
        let mut child = self.child.lock();
        let _ = child.kill();
        let _ = child.wait();
    }

    #[cfg(unix)]
    fn signal_terminate(&self) {
        let Ok(pid) = libc::pid_t::try_from(self.pid) else {
            return;
        };
        // SAFETY: plain signal delivery to a child we spawned and have not reaped
        if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
            crate::debug!("recompiler"; "SIGTERM failed: {}", io::Error::last_os_error());
        }
    }

    #[cfg(not(unix))]
    fn signal_terminate(&self) {
        let _ = self.child.lock().kill();
    }
}

impl Drop for BuildProcess {
    fn drop(&mut self) {
        let mut child = self.child.lock();
        if matches!(child.try_wait(), Ok(None)) {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Forward every output line until end of stream.
///
/// The pipe is drained to the end even after forwarding failed.
fn spawn_output_reader(output: PipeReader, orchestration: Arc<dyn Orchestration>) -> io::Result<()> {
    thread::Builder::new()
        .name("recompiler-output".into())
        .spawn(move || {
            let mut reader = BufReader::new(output);
            let mut buf = Vec::new();
            let mut forwarding = true;
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf);
                        let line = line.trim_end_matches(['\n', '\r']);
                        crate::debug!("compiler"; "{}", strip_ansi(line));
                        if forwarding
                            && let Err(e) = orchestration.send(OrchestrationMessage::compiler_log(line))
                        {
                            crate::debug!("recompiler"; "dropping build output: {}", e);
                            forwarding = false;
                        }
                    }
                    Err(e) => {
                        crate::debug!("recompiler"; "output stream closed: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(())
}
