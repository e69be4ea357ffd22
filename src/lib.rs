//! hotswap - recompile scheduler and in-process class reload engine.
//!
//! The agent side of a live-code-reload tool: it turns change notifications
//! from an orchestration process into build tool runs and into in-place
//! redefinition of already loaded classes.
//!
//! # Architecture
//!
//! ```text
//! orchestration ──► Bus ──► Recompiler ──► build tool (gradle / amper)
//!                    │          └── RecompileResult, LogMessage ──► Bus
//!                    └────► ReloadEngine ──► Runtime (hot-swap facility)
//!                               └── ReloadClassesResult ──► Bus
//! ```

pub mod logger;

pub mod agent;
pub mod build;
pub mod classfile;
pub mod cli;
pub mod config;
pub mod core;
pub mod orchestration;
pub mod recompiler;
pub mod reload;
pub mod utils;
