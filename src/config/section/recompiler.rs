//! `[recompiler]` and `[log]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [recompiler]
//! warmup = true    # Start one build right away (starts the continuous build)
//!
//! [log]
//! verbose = false
//! ```

use serde::{Deserialize, Serialize};

/// Recompiler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecompilerConfig {
    /// Seed the request buffer with one request before the worker starts.
    pub warmup: bool,
}

impl Default for RecompilerConfig {
    fn default() -> Self {
        Self { warmup: true }
    }
}

/// Local logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Show debug output.
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_recompiler_defaults() {
        let config = test_parse_config("");
        assert!(config.recompiler.warmup);
        assert!(!config.log.verbose);
    }

    #[test]
    fn test_recompiler_warmup_disabled() {
        let config = test_parse_config("[recompiler]\nwarmup = false\n[log]\nverbose = true");
        assert!(!config.recompiler.warmup);
        assert!(config.log.verbose);
    }
}
