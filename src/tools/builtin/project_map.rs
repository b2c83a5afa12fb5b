//! project_map tool - tree view of the workspace

use async_trait::async_trait;
use serde_json::Value;
use walkdir::WalkDir;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::is_ignored;

/// Lines kept before the map is truncated
const MAX_LINES: usize = 200;

/// Display the workspace structure as a depth-limited tree
pub struct ProjectMapTool;

#[async_trait]
impl Tool for ProjectMapTool {
    fn name(&self) -> &'static str {
        "project_map"
    }

    fn description(&self) -> &'static str {
        "Display the workspace directory structure as a tree. Skips build artifacts and dotfiles."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "max_depth": {
                    "type": "integer",
                    "description": "Maximum depth to traverse (default: 3)"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let max_depth = input["max_depth"].as_u64().unwrap_or(3) as usize;

        let root_name = ctx
            .workspace
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        let mut output = vec![format!("{}/", root_name)];

        let walker = WalkDir::new(&ctx.workspace)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.depth() == 0 {
                continue;
            }

            let is_dir = entry.file_type().is_dir();
            let name = entry.file_name().to_string_lossy();
            let suffix = if is_dir { "/" } else { "" };

            let indent = "    ".repeat(entry.depth().saturating_sub(1));
            output.push(format!("{}├── {}{}", indent, name, suffix));
        }

        if output.len() > MAX_LINES {
            let total = output.len();
            output.truncate(MAX_LINES);
            output.push(format!("... (truncated, {} entries total)", total));
        }

        ToolResult::success(output.join("\n"))
    }
}
