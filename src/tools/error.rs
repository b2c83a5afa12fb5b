//! Tool error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Path {path} escapes workspace {workspace}")]
    SandboxViolation { path: PathBuf, workspace: PathBuf },

    #[error("File {path} is not in the allowed list. Plan mentions: [{}]", .allowed.join(", "))]
    WriteNotAllowed { path: String, allowed: Vec<String> },

    #[error("Tool not found: {name}")]
    UnknownTool { name: String },

    #[error("Command timed out after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
