//! `[orchestration]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [orchestration]
//! port = 41234    # Port of the orchestration server, handed to the build tool
//! ```

use serde::{Deserialize, Serialize};

/// Orchestration settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Port forwarded to the build tool so it can report back.
    pub port: u16,
}
