//! hotswap - live reload agent.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{ColorChoice, Parser};

use hotswap::agent::Agent;
use hotswap::build::{ORCHESTRATION_PORT_ENV, strategy_for};
use hotswap::cli::{Cli, Commands};
use hotswap::config::{AgentConfig, cfg, init_config};
use hotswap::orchestration::{Bus, stdio};
use hotswap::utils::exec::EnvMode;
use hotswap::{core, debug, log};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    init_config(AgentConfig::load(&cli)?);

    match &cli.command {
        Commands::Run { .. } => run(),
        Commands::Plan { .. } => plan(),
    }
}

// =============================================================================
// Run Command
// =============================================================================

/// Serve orchestration messages on stdin/stdout until shutdown.
fn run() -> Result<()> {
    let config = cfg();
    let (bus, outbound) = Bus::new(config.orchestration.port);

    let writer = Arc::new(
        stdio::spawn_writer(outbound, io::stdout()).context("Failed to start orchestration writer")?,
    );

    // Ctrl+C: close the bus, which stops the recompiler and reports pending
    // results, then let the writer deliver them before exiting
    let shutdown_bus = Arc::clone(&bus);
    let shutdown_writer = Arc::clone(&writer);
    core::on_shutdown(move || {
        shutdown_bus.close();
        shutdown_writer.finish(stdio::FLUSH_TIMEOUT);
        std::process::exit(130);
    });

    // The binary has no hot-swap facility; embedders pass their runtime here
    let agent = Agent::attach(&bus, &config, None);
    debug!(
        "agent";
        "started (recompiler: {}, reload: {})",
        agent.is_recompiling(),
        agent.is_reloading()
    );

    stdio::pump(&bus, io::stdin().lock());
    core::request_shutdown();

    if !writer.finish(stdio::FLUSH_TIMEOUT) {
        return Err(anyhow!("orchestration writer did not finish"));
    }
    debug!("agent"; "stopped");
    Ok(())
}

// =============================================================================
// Plan Command
// =============================================================================

/// Print the command a build cycle would run.
fn plan() -> Result<()> {
    let config = cfg();
    let strategy = strategy_for(&config.build)?;
    let cmd = strategy.invocation(config.orchestration.port);

    log!("plan"; "{} build{}", strategy.name(), if strategy.is_continuous() { " (continuous)" } else { "" });
    if let Some(dir) = cmd.get_cwd() {
        println!("cd {}", dir.display());
    }
    for key in ["JAVA_HOME", ORCHESTRATION_PORT_ENV] {
        if let Some((value, mode)) = cmd.get_env(key) {
            let note = match mode {
                EnvMode::Set => "",
                EnvMode::IfAbsent => " # unless already set",
            };
            println!("{key}={value}{note}");
        }
    }
    println!("{cmd}");
    Ok(())
}
