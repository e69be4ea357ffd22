use std::io;

use thiserror::Error;

use crate::config::FieldPath;

/// Errors that prevent the recompiler from starting.
#[derive(Debug, Error)]
pub enum RecompilerError {
    /// A required build coordinate is not configured
    #[error("missing {0} property")]
    MissingProperty(FieldPath),

    #[error("failed to spawn recompiler thread: {0}")]
    Thread(#[source] io::Error),
}
