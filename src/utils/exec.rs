//! External command construction and spawning.
//!
//! Provides a Builder-based API describing a command line, its working
//! directory and environment. Build tool strategies return a [`Cmd`]; the
//! recompiler spawns it with stdout and stderr merged into one pipe.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let cmd = Cmd::new("./gradlew")
//!     .args([":app:compileKotlin", "--console=plain"])
//!     .cwd(root)
//!     .env_if_absent("JAVA_HOME", java_home);
//! let (child, output) = cmd.spawn_merged()?;
//! ```

use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::{self, PipeReader},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::OnceLock,
};

// ============================================================================
// Builder API
// ============================================================================

/// How an environment variable is applied to the subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    /// Always set, overriding the inherited value.
    Set,
    /// Only set when the inherited environment has no value.
    IfAbsent,
}

/// Command builder for external process execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String, EnvMode)>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["./gradlew"]` or `["cmd", "/c", "start", "gradlew.bat"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set an environment variable for the subprocess.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into(), EnvMode::Set));
        self
    }

    /// Set an environment variable unless the parent environment already has it.
    pub fn env_if_absent(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into(), EnvMode::IfAbsent));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> impl Iterator<Item = &OsStr> {
        self.args.iter().map(OsString::as_os_str)
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Look up a configured environment variable.
    pub fn get_env(&self, key: &str) -> Option<(&str, EnvMode)> {
        self.envs
            .iter()
            .rev()
            .find(|(k, _, _)| k == key)
            .map(|(_, v, mode)| (v.as_str(), *mode))
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Spawn the command with stdout and stderr merged into a single pipe.
    ///
    /// The caller owns the returned reader and must drain it, otherwise the
    /// child blocks once the pipe buffer is full.
    pub fn spawn_merged(&self) -> io::Result<(Child, PipeReader)> {
        let (reader, writer) = io::pipe()?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        for (key, value, mode) in &self.envs {
            if *mode == EnvMode::IfAbsent && std::env::var_os(key).is_some() {
                continue;
            }
            cmd.env(key, value);
        }

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn()?;
        // `cmd` still holds the write ends; the reader sees EOF only once they are gone
        drop(cmd);
        Ok((child, reader))
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
pub fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================
