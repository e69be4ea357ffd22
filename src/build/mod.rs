//! Build tool invocation strategies.
//!
//! Each supported build tool turns its `[build.*]` coordinates into the
//! command line the recompiler spawns once per build cycle.
//!
//! ```text
//! BuildSectionConfig ──strategy_for()──► Box<dyn BuildInvocation>
//!                                              │ invocation(port)
//!                                              ▼
//!                                             Cmd
//! ```

mod amper;
mod gradle;

pub use amper::{AmperInvocation, ORCHESTRATION_PORT_ENV};
pub use gradle::{GradleInvocation, JAVA_HOME_PROPERTY, ORCHESTRATION_PORT_PROPERTY};

use crate::config::{BuildSectionConfig, BuildSystem, FieldPath};
use crate::recompiler::RecompilerError;
use crate::utils::exec::Cmd;

/// Command line construction for one build tool.
pub trait BuildInvocation: Send + Sync {
    /// Human-readable build tool name.
    fn name(&self) -> &'static str;

    /// Command running one build, reporting to the orchestration `port`.
    fn invocation(&self, port: u16) -> Cmd;

    /// Whether the build tool keeps running and rebuilds by itself.
    fn is_continuous(&self) -> bool {
        false
    }
}

/// Select and validate the strategy for the configured build tool.
pub fn strategy_for(config: &BuildSectionConfig) -> Result<Box<dyn BuildInvocation>, RecompilerError> {
    match config.system {
        BuildSystem::Gradle => {
            let strategy = GradleInvocation::from_config(&config.gradle, config.continuous)?;
            Ok(Box::new(strategy))
        }
        BuildSystem::Amper => {
            if config.continuous {
                crate::log!("warning"; "amper does not support continuous builds, ignoring");
            }
            Ok(Box::new(AmperInvocation::from_config(&config.amper)?))
        }
    }
}

/// Require a configured value, naming the missing field otherwise.
fn require<T: Clone>(value: &Option<T>, field: FieldPath) -> Result<T, RecompilerError> {
    value.clone().ok_or(RecompilerError::MissingProperty(field))
}

/// Wrapper script invocation for the current platform.
fn wrapper_script(unix: &str, windows: &str) -> Cmd {
    if cfg!(windows) {
        Cmd::from_slice(&["cmd", "/c", "start", windows])
    } else {
        Cmd::new(unix)
    }
}
