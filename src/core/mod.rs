//! Core types - pure abstractions shared across the codebase.

mod id;
mod state;

pub use id::MessageId;
pub use state::{
    HookRegistry, TerminationHook, is_shutdown, on_shutdown, request_shutdown,
    run_termination_hooks, setup_shutdown_handler, termination_hooks,
};
