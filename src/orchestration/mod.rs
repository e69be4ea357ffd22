//! Orchestration client: message protocol, in-process bus and stdio transport.
//!
//! ```text
//! stdin ──pump()──► Bus ──listeners──► Agent (recompiler, reload engine)
//!                    ▲
//! stdout ◄─writer────┘ send()
//! ```

mod bus;
mod message;
pub mod stdio;

pub use bus::{Bus, Orchestration, OrchestrationError};
pub use message::{ChangeType, OrchestrationMessage, TAG_AGENT, TAG_COMPILER};
