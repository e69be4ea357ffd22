//! Gradle invocation.

use std::path::PathBuf;

use super::{BuildInvocation, require, wrapper_script};
use crate::config::GradleConfig;
use crate::recompiler::RecompilerError;
use crate::utils::exec::Cmd;

/// System property carrying the orchestration port.
pub const ORCHESTRATION_PORT_PROPERTY: &str = "hotswap.orchestration.port";
/// System property carrying the java home used by the build.
pub const JAVA_HOME_PROPERTY: &str = "hotswap.gradle.java.home";

/// Runs `<project>:<task>` through the Gradle wrapper of the build root.
#[derive(Debug, Clone)]
pub struct GradleInvocation {
    root: PathBuf,
    project: String,
    task: String,
    java_home: Option<String>,
    continuous: bool,
}

impl GradleInvocation {
    pub fn from_config(config: &GradleConfig, continuous: bool) -> Result<Self, RecompilerError> {
        let root = require(&config.root, GradleConfig::ROOT)?;
        let project = require(&config.project, GradleConfig::PROJECT)?;
        let task = require(&config.task, GradleConfig::TASK)?;

        let java_home = config.java_home.as_ref().map(|p| p.to_string_lossy().into_owned());
        if java_home.is_none() {
            crate::log!("warning"; "missing {}, using system java", GradleConfig::JAVA_HOME);
        }

        Ok(Self {
            root,
            project,
            task,
            java_home,
            continuous,
        })
    }

    /// Fully qualified task path (`:task` for the root project).
    pub fn task_path(&self) -> String {
        if self.project == ":" {
            format!(":{}", self.task)
        } else {
            format!("{}:{}", self.project, self.task)
        }
    }
}

impl BuildInvocation for GradleInvocation {
    fn name(&self) -> &'static str {
        "gradle"
    }

    fn invocation(&self, port: u16) -> Cmd {
        let mut cmd = wrapper_script("./gradlew", "gradlew.bat")
            .cwd(&self.root)
            .arg(self.task_path())
            .arg("--console=plain")
            .arg(format!("-D{ORCHESTRATION_PORT_PROPERTY}={port}"));

        if let Some(home) = &self.java_home {
            cmd = cmd.arg(format!("-D{JAVA_HOME_PROPERTY}={home}"));
        }
        if self.continuous {
            cmd = cmd.args(["-t", "--priority=low", "--no-daemon"]);
        }

        cmd.env_if_absent("JAVA_HOME", self.java_home.clone().unwrap_or_default())
    }

    fn is_continuous(&self) -> bool {
        self.continuous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::exec::EnvMode;
    use std::path::Path;

    fn config(project: &str, java_home: Option<&str>) -> GradleConfig {
        GradleConfig {
            root: Some(PathBuf::from("/work")),
            project: Some(project.to_string()),
            task: Some("reload".to_string()),
            java_home: java_home.map(PathBuf::from),
        }
    }

    fn args(cmd: &Cmd) -> Vec<String> {
        cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_task_path() {
        let root = GradleInvocation::from_config(&config(":", None), false).unwrap();
        assert_eq!(root.task_path(), ":reload");

        let sub = GradleInvocation::from_config(&config(":app", None), false).unwrap();
        assert_eq!(sub.task_path(), ":app:reload");
    }

    #[cfg(unix)]
    #[test]
    fn test_invocation_one_shot() {
        let strategy = GradleInvocation::from_config(&config(":app", Some("/opt/jdk")), false).unwrap();
        let cmd = strategy.invocation(4100);

        assert_eq!(cmd.program_name(), "./gradlew");
        assert_eq!(cmd.get_cwd(), Some(Path::new("/work")));
        assert_eq!(
            args(&cmd),
            [
                ":app:reload",
                "--console=plain",
                "-Dhotswap.orchestration.port=4100",
                "-Dhotswap.gradle.java.home=/opt/jdk",
            ]
        );
        assert_eq!(cmd.get_env("JAVA_HOME"), Some(("/opt/jdk", EnvMode::IfAbsent)));
        assert!(!strategy.is_continuous());
    }

    #[test]
    fn test_invocation_continuous_without_java_home() {
        let strategy = GradleInvocation::from_config(&config(":", None), true).unwrap();
        let cmd = strategy.invocation(1);
        let args = args(&cmd);

        assert!(strategy.is_continuous());
        assert_eq!(args[args.len() - 3..], ["-t", "--priority=low", "--no-daemon"]);
        assert!(!args.iter().any(|a| a.starts_with("-Dhotswap.gradle.java.home")));
        assert_eq!(cmd.get_env("JAVA_HOME"), Some(("", EnvMode::IfAbsent)));
    }

    #[test]
    fn test_invocation_repeatable_per_cycle() {
        let strategy = GradleInvocation::from_config(&config(":", None), false).unwrap();
        assert_eq!(strategy.java_home, None);
        assert_eq!(strategy.invocation(7), strategy.invocation(7));
    }
}
