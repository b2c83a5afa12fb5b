//! read_file tool - read file contents

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use crate::tools::{Tool, ToolContext, ToolResult};

/// Lines returned before the output is truncated
const MAX_LINES: usize = 200;

/// Read a file's contents, truncated at 200 lines
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file's contents. Output is truncated at 200 lines."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let path = match input["path"].as_str() {
            Some(p) => p,
            None => return ToolResult::error("path is required"),
        };

        let full_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Failed to read file: {}", e)),
        };

        let total_lines = content.lines().count();
        if total_lines <= MAX_LINES {
            return ToolResult::success(content);
        }

        let mut truncated: String = content.lines().take(MAX_LINES).collect::<Vec<_>>().join("\n");
        truncated.push_str(&format!("\n... (truncated, {} total lines)", total_lines));
        ToolResult::success(truncated)
    }
}
