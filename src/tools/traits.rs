//! Tool trait definition

use async_trait::async_trait;
use serde_json::Value;

use super::context::ToolContext;

/// A tool that can be called by the LLM
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the tool_use name on the wire)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn parameters(&self) -> Value;

    /// Whether this tool mutates the workspace (write allow-lists apply)
    fn is_write(&self) -> bool {
        false
    }

    /// Execute the tool
    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult;
}

/// Result of a tool execution
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }

    /// The content as fed back to the model: errors are prefixed and an
    /// empty success becomes the literal "Success" so the model always
    /// receives non-empty tool content.
    pub fn feedback(&self) -> String {
        if self.is_error {
            format!("Error: {}", self.content)
        } else if self.content.is_empty() {
            "Success".to_string()
        } else {
            self.content.clone()
        }
    }
}
