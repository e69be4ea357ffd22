//! Orchestration Message Protocol
//!
//! Defines the JSON message format exchanged between the agent, the build
//! driver and the controlling process.
//!
//! # Message Types
//!
//! - `RecompileRequest`: trigger a build cycle (queueable, coalesced)
//! - `RecompilerReady`: the recompiler accepts requests
//! - `RecompileResult`: one per drained request, in drain order
//! - `LogMessage`: one build output line (tag `compiler`)
//! - `ReloadClassesRequest` / `ReloadClassesResult`: in-place class reload
//! - `ShutdownRequest`: close the bus

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::MessageId;

/// Tag of log lines produced by the build process.
pub const TAG_COMPILER: &str = "compiler";
/// Tag of diagnostics produced by the agent itself.
pub const TAG_AGENT: &str = "agent";

/// Kind of change detected for a compiled artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

impl ChangeType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "Added",
            Self::Modified => "Modified",
            Self::Removed => "Removed",
        }
    }
}

/// Message carried on the orchestration bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrchestrationMessage {
    /// Trigger one build cycle
    #[serde(rename_all = "camelCase")]
    RecompileRequest { message_id: MessageId },

    /// Recompiler is up (suppressed in continuous mode)
    RecompilerReady,

    /// Outcome of the build cycle that drained the request
    #[serde(rename_all = "camelCase")]
    RecompileResult {
        recompile_request_id: MessageId,
        /// Absent when the process did not exit cleanly
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },

    /// A single line of tagged log output
    LogMessage { tag: String, message: String },

    /// Reload changed class files into the running process
    #[serde(rename_all = "camelCase")]
    ReloadClassesRequest {
        reload_request_id: MessageId,
        changed_class_files: BTreeMap<PathBuf, ChangeType>,
    },

    /// Outcome of a reload request
    #[serde(rename_all = "camelCase")]
    ReloadClassesResult {
        reload_request_id: MessageId,
        is_success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
    },

    /// Close the bus
    ShutdownRequest,
}

impl OrchestrationMessage {
    /// Create a recompile request with a generated id
    pub fn recompile_request() -> Self {
        Self::RecompileRequest {
            message_id: MessageId::generate(),
        }
    }

    /// Create a build output log line
    pub fn compiler_log(line: impl Into<String>) -> Self {
        Self::LogMessage {
            tag: TAG_COMPILER.to_string(),
            message: line.into(),
        }
    }

    /// Create a successful reload result
    pub fn reload_success(reload_request_id: MessageId) -> Self {
        Self::ReloadClassesResult {
            reload_request_id,
            is_success: true,
            error_message: None,
        }
    }

    /// Create a failed reload result
    pub fn reload_failure(reload_request_id: MessageId, error: impl Into<String>) -> Self {
        Self::ReloadClassesResult {
            reload_request_id,
            is_success: false,
            error_message: Some(error.into()),
        }
    }

    /// Serialize to one JSON line (without trailing newline)
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"ShutdownRequest"}"#.to_string())
    }

    /// Parse from one JSON line
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}
