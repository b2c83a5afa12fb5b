//! list_files tool - recursive file listing

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::is_ignored;

/// Entries returned before the listing is truncated
const MAX_ENTRIES: usize = 30;

/// Recursively list files, skipping build artifacts and dotfiles
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "Recursively list files in a directory. Skips build artifacts and dotfiles. Optionally filter by a glob pattern."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list (default: workspace root)"
                },
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern to filter file names, e.g. '*.go'"
                }
            }
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let path = input["path"].as_str().unwrap_or(".");
        let pattern = match input["pattern"].as_str() {
            Some(p) => match glob::Pattern::new(p) {
                Ok(pat) => Some(pat),
                Err(e) => return ToolResult::error(format!("Invalid pattern '{}': {}", p, e)),
            },
            None => None,
        };

        let root = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        if !root.is_dir() {
            return ToolResult::error(format!("{} is not a directory", path));
        }

        let mut files = Vec::new();
        let mut total = 0usize;

        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(pat) = &pattern {
                let name = entry.file_name().to_string_lossy();
                if !pat.matches(&name) {
                    continue;
                }
            }
            total += 1;
            if files.len() < MAX_ENTRIES {
                let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                files.push(rel.to_string_lossy().to_string());
            }
        }

        if total == 0 {
            return ToolResult::success("No files found");
        }

        let mut output = files.join("\n");
        if total > MAX_ENTRIES {
            output.push_str(&format!("\n... ({} more files)", total - MAX_ENTRIES));
        }
        ToolResult::success(output)
    }
}
