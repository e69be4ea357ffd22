//! Agent configuration management for `hotswap.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [build], [orchestration], [recompiler], [log]
//! ├── types/         # ConfigError, FieldPath, global handle
//! └── mod.rs         # AgentConfig (this file)
//! ```
//!
//! A missing config file is not an error: every field has a default and the
//! build coordinates can come from the command line. Missing coordinates are
//! reported when the recompiler starts.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    AmperConfig, BuildSectionConfig, BuildSystem, GradleConfig, LogConfig, OrchestrationConfig,
    RecompilerConfig,
};
pub use types::{ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing hotswap.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Build tool settings
    #[serde(default)]
    pub build: BuildSectionConfig,

    /// Orchestration settings
    #[serde(default)]
    pub orchestration: OrchestrationConfig,

    /// Recompiler settings
    #[serde(default)]
    pub recompiler: RecompilerConfig,

    /// Local logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl AgentConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The root is the config
    /// file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => Self {
                root: cwd.clone(),
                config_path: cwd.join(&cli.config),
                ..Self::default()
            },
        };

        config.apply_command_options(cli);
        let root = config.root.clone();
        config.build.normalize_paths(&root);
        crate::logger::set_verbose(config.log.verbose);

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("Failed to parse `{}`", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    ///
    /// The agent never prompts: stdin carries orchestration messages.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            log!("warning"; "- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Run {
                build_args,
                port,
                no_warmup,
            } => {
                self.apply_build_args(build_args);
                Self::update_option(&mut self.orchestration.port, port.as_ref());
                if *no_warmup {
                    self.recompiler.warmup = false;
                }
            }
            Commands::Plan { build_args } => self.apply_build_args(build_args),
        }
    }

    /// Apply build coordinates from CLI to the selected build system.
    fn apply_build_args(&mut self, args: &BuildArgs) {
        if args.verbose {
            self.log.verbose = true;
        }

        Self::update_option(&mut self.build.system, args.system.as_ref());
        Self::update_option(&mut self.build.continuous, args.continuous.as_ref());

        match self.build.system {
            BuildSystem::Gradle => {
                let gradle = &mut self.build.gradle;
                Self::update_some(&mut gradle.root, args.root.as_ref());
                Self::update_some(&mut gradle.project, args.project.as_ref());
                Self::update_some(&mut gradle.task, args.task.as_ref());
                Self::update_some(&mut gradle.java_home, args.java_home.as_ref());
            }
            BuildSystem::Amper => {
                let amper = &mut self.build.amper;
                Self::update_some(&mut amper.root, args.root.as_ref());
                Self::update_some(&mut amper.task, args.task.as_ref());
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update optional config field if CLI value is provided.
    fn update_some<T: Clone>(config_option: &mut Option<T>, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = Some(option.clone());
        }
    }
}

/// Parse a config snippet for section tests.
#[cfg(test)]
pub(crate) fn test_parse_config(content: &str) -> AgentConfig {
    AgentConfig::from_str(content).expect("test config should parse")
}
