//! Utility modules shared by the recompiler and the reload engine.

pub mod exec;
pub mod hash;
