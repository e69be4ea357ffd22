//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads: the agent, the recompiler thread and
//! reload calls all read the same snapshot without coordination.

use crate::config::AgentConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<AgentConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(AgentConfig::default()));

#[inline]
pub fn cfg() -> Arc<AgentConfig> {
    CONFIG.load_full()
}

/// Install the loaded config as the global snapshot.
#[inline]
pub fn init_config(config: AgentConfig) -> Arc<AgentConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
