//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BuildSystem;

/// hotswap live-reload agent CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: hotswap.toml)
    #[arg(short = 'C', long, global = true, default_value = "hotswap.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the agent, exchanging orchestration messages as JSON lines on stdin/stdout
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Orchestration port forwarded to the build tool
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not start a build before the first request arrives
        #[arg(long)]
        no_warmup: bool,
    },

    /// Print the build command the recompiler would run
    #[command(visible_alias = "p")]
    Plan {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

/// Build coordinates shared by Run and Plan
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Build tool driving recompilation
    #[arg(short, long, value_enum)]
    pub system: Option<BuildSystem>,

    /// Build root directory (contains the build tool wrapper script)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Gradle project path (e.g. `:app`, `:` for the root project)
    #[arg(long)]
    pub project: Option<String>,

    /// Build task to run
    #[arg(short, long)]
    pub task: Option<String>,

    /// Java home handed to Gradle
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub java_home: Option<PathBuf>,

    /// Let the build tool watch and rebuild continuously
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub continuous: Option<bool>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    /// Build arguments of the current command.
    pub fn build_args(&self) -> &BuildArgs {
        match &self.command {
            Commands::Run { build_args, .. } | Commands::Plan { build_args } => build_args,
        }
    }
}
