//! Amper invocation.

use std::path::PathBuf;

use super::{BuildInvocation, require, wrapper_script};
use crate::config::AmperConfig;
use crate::recompiler::RecompilerError;
use crate::utils::exec::Cmd;

/// Environment variable carrying the orchestration port.
pub const ORCHESTRATION_PORT_ENV: &str = "HOTSWAP_ORCHESTRATION_PORT";

/// Runs `amper task <task>` in the build root.
#[derive(Debug, Clone)]
pub struct AmperInvocation {
    root: PathBuf,
    task: String,
}

impl AmperInvocation {
    pub fn from_config(config: &AmperConfig) -> Result<Self, RecompilerError> {
        Ok(Self {
            root: require(&config.root, AmperConfig::ROOT)?,
            task: require(&config.task, AmperConfig::TASK)?,
        })
    }
}

impl BuildInvocation for AmperInvocation {
    fn name(&self) -> &'static str {
        "amper"
    }

    fn invocation(&self, port: u16) -> Cmd {
        wrapper_script("./amper", "amper.bat")
            .cwd(&self.root)
            .args(["task", self.task.as_str()])
            .env_if_absent(ORCHESTRATION_PORT_ENV, port.to_string())
    }
}
