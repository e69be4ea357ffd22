//! Agent wiring.
//!
//! Connects the orchestration bus to the recompiler and the reload engine:
//!
//! ```text
//! RecompileRequest      ──► RequestQueue ──► Recompiler ──► RecompileResult
//! ReloadClassesRequest  ──► ReloadEngine ──────────────────► ReloadClassesResult
//! bus closed            ──► Recompiler::shutdown
//! ```

use std::sync::{Arc, Weak};

use crate::config::AgentConfig;
use crate::core::MessageId;
use crate::orchestration::{Bus, Orchestration, OrchestrationMessage, TAG_AGENT};
use crate::recompiler::{RecompileRequest, Recompiler};
use crate::reload::{ReloadEngine, Runtime};
use crate::{debug, log};

/// Reply sent when no hot-swap facility is available.
pub const NO_RUNTIME: &str = "no runtime attached";

/// What the agent managed to start.
pub struct Agent {
    recompiling: bool,
    reloading: bool,
}

impl Agent {
    /// Attach the recompiler and, with a runtime, the reload engine to `bus`.
    ///
    /// A recompiler that cannot start is reported; reload requests are still
    /// answered.
    pub fn attach(bus: &Arc<Bus>, config: &AgentConfig, runtime: Option<Arc<dyn Runtime>>) -> Self {
        let recompiling = Self::attach_recompiler(bus, config);
        let reloading = runtime.is_some();
        Self::attach_reload(bus, runtime.map(ReloadEngine::new));
        Self {
            recompiling,
            reloading,
        }
    }

    pub fn is_recompiling(&self) -> bool {
        self.recompiling
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    fn attach_recompiler(bus: &Arc<Bus>, config: &AgentConfig) -> bool {
        let orchestration: Arc<dyn Orchestration> = bus.clone();
        let recompiler = match Recompiler::from_config(&config.build, &config.recompiler, orchestration) {
            Ok(recompiler) => recompiler,
            Err(e) => {
                log!("error"; "recompiler not started: {}", e);
                return false;
            }
        };

        let queue = recompiler.queue().clone();
        bus.invoke_when_received(move |message| {
            if let OrchestrationMessage::RecompileRequest { message_id } = message {
                debug!("recompiler"; "request {}", message_id);
                queue.enqueue(RecompileRequest::with_id(message_id.clone()));
            }
        });
        bus.invoke_when_closed(move || recompiler.shutdown());
        true
    }

    fn attach_reload(bus: &Arc<Bus>, engine: Option<ReloadEngine>) {
        // The listener lives inside the bus, so it must not keep the bus alive
        let reply: Weak<Bus> = Arc::downgrade(bus);
        bus.invoke_when_received(move |message| {
            let OrchestrationMessage::ReloadClassesRequest {
                reload_request_id,
                changed_class_files,
            } = message
            else {
                return;
            };
            let Some(bus) = reply.upgrade() else {
                return;
            };

            let replies = match &engine {
                Some(engine) => match engine.reload(reload_request_id.clone(), changed_class_files) {
                    Ok(outcome) => vec![
                        OrchestrationMessage::LogMessage {
                            tag: TAG_AGENT.to_string(),
                            message: format!("reloaded {} class(es)", outcome.definitions.len()),
                        },
                        OrchestrationMessage::reload_success(outcome.reload_request_id),
                    ],
                    Err(e) => {
                        log!("error"; "reload {} failed: {}", reload_request_id, e);
                        vec![OrchestrationMessage::reload_failure(reload_request_id.clone(), e.to_string())]
                    }
                },
                None => vec![no_runtime(reload_request_id)],
            };

            for reply in replies {
                if let Err(e) = bus.send(reply) {
                    debug!("reload"; "dropping reply: {}", e);
                }
            }
        });
    }
}

fn no_runtime(id: &MessageId) -> OrchestrationMessage {
    log!("warning"; "reload {} ignored: {}", id, NO_RUNTIME);
    OrchestrationMessage::reload_failure(id.clone(), NO_RUNTIME)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::time::Duration;

    use crossbeam::channel::Receiver;
    use tempfile::TempDir;

    use super::*;
    use crate::classfile::testing::ClassBuilder;
    use crate::config::{BuildSystem, test_parse_config};
    use crate::orchestration::ChangeType;
    use crate::reload::testing::FakeRuntime;

    const TIMEOUT: Duration = Duration::from_secs(20);

    fn next_reply(rx: &Receiver<OrchestrationMessage>) -> OrchestrationMessage {
        loop {
            match rx.recv_timeout(TIMEOUT).expect("timed out waiting for reply") {
                OrchestrationMessage::LogMessage { .. } | OrchestrationMessage::RecompilerReady => continue,
                message => return message,
            }
        }
    }

    fn reload_request(id: &str, files: &[(std::path::PathBuf, ChangeType)]) -> OrchestrationMessage {
        OrchestrationMessage::ReloadClassesRequest {
            reload_request_id: MessageId::new(id),
            changed_class_files: files.iter().cloned().collect::<BTreeMap<_, _>>(),
        }
    }

    /// Amper build rooted in a directory without the wrapper script.
    fn unbuildable(dir: &TempDir, warmup: bool) -> AgentConfig {
        let mut config = test_parse_config("[build]\nsystem = \"amper\"\n[build.amper]\ntask = \"jvm\"");
        config.build.amper.root = Some(dir.path().join("missing"));
        config.recompiler.warmup = warmup;
        config
    }

    #[test]
    fn test_recompile_request_reaches_recompiler() {
        let dir = TempDir::new().unwrap();
        let (bus, rx) = Bus::new(0);
        let config = unbuildable(&dir, false);
        assert_eq!(config.build.system, BuildSystem::Amper);

        let agent = Agent::attach(&bus, &config, None);
        assert!(agent.is_recompiling());
        assert!(!agent.is_reloading());

        bus.dispatch(&OrchestrationMessage::RecompileRequest {
            message_id: MessageId::new("A"),
        });
        assert_eq!(
            next_reply(&rx),
            OrchestrationMessage::RecompileResult {
                recompile_request_id: MessageId::new("A"),
                exit_code: None,
            }
        );
        bus.close();
    }

    #[test]
    fn test_warmup_request_built_on_start() {
        let dir = TempDir::new().unwrap();
        let (bus, rx) = Bus::new(0);
        Agent::attach(&bus, &unbuildable(&dir, true), None);

        assert!(matches!(
            next_reply(&rx),
            OrchestrationMessage::RecompileResult { exit_code: None, .. }
        ));
        bus.close();
    }

    #[test]
    fn test_missing_build_config_still_answers_reloads() {
        let (bus, rx) = Bus::new(0);
        let agent = Agent::attach(&bus, &AgentConfig::default(), None);
        assert!(!agent.is_recompiling());

        bus.dispatch(&reload_request("r1", &[]));
        assert_eq!(
            next_reply(&rx),
            OrchestrationMessage::reload_failure(MessageId::new("r1"), NO_RUNTIME)
        );
        bus.close();
    }

    #[test]
    fn test_reload_request_answered() {
        let dir = TempDir::new().unwrap();
        let runtime = FakeRuntime::new();
        runtime.load(ClassBuilder::new("A").method("m", "()V", &[0xB1]).build());
        let path = dir.path().join("A.class");
        fs::write(&path, ClassBuilder::new("A").method("m", "()V", &[0x00, 0xB1]).build()).unwrap();

        let (bus, rx) = Bus::new(0);
        let agent = Agent::attach(&bus, &AgentConfig::default(), Some(runtime.clone() as Arc<dyn Runtime>));
        assert!(agent.is_reloading());

        bus.dispatch(&reload_request("r1", &[(path.clone(), ChangeType::Modified)]));
        assert_eq!(next_reply(&rx), OrchestrationMessage::reload_success(MessageId::new("r1")));
        assert_eq!(runtime.redefine_calls(), 1);

        runtime.set_reject(true);
        bus.dispatch(&reload_request("r2", &[(path, ChangeType::Modified)]));
        let OrchestrationMessage::ReloadClassesResult {
            reload_request_id,
            is_success,
            error_message,
        } = next_reply(&rx)
        else {
            panic!("expected reload result");
        };
        assert_eq!(reload_request_id, MessageId::new("r2"));
        assert!(!is_success);
        assert!(error_message.unwrap().contains("rejected"));
        bus.close();
    }
}
