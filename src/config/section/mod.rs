//! Configuration section definitions.
//!
//! | Section            | Purpose                                        |
//! |--------------------|------------------------------------------------|
//! | `[build]`          | Build tool selection and coordinates           |
//! | `[orchestration]`  | Orchestration port forwarded to the build tool |
//! | `[recompiler]`     | Recompiler behavior (warm-up)                  |
//! | `[log]`            | Local logging                                  |

mod build;
mod orchestration;
mod recompiler;

pub use build::{AmperConfig, BuildSectionConfig, BuildSystem, GradleConfig};
pub use orchestration::OrchestrationConfig;
pub use recompiler::{LogConfig, RecompilerConfig};
