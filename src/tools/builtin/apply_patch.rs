//! apply_patch tool - exact-substring replacement

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use crate::events::FileChange;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Replace an exact substring in a file
///
/// Preferred over write_file for targeted edits: the model supplies the
/// text to find verbatim and its replacement.
pub struct ApplyPatchTool;

#[async_trait]
impl Tool for ApplyPatchTool {
    fn name(&self) -> &'static str {
        "apply_patch"
    }

    fn description(&self) -> &'static str {
        "Replace an exact substring in a file. Fails if the search text does not appear verbatim. Prefer this over write_file for small edits."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace"
                },
                "search": {
                    "type": "string",
                    "description": "Exact text to find, including whitespace"
                },
                "replace": {
                    "type": "string",
                    "description": "Replacement text"
                }
            },
            "required": ["path", "search", "replace"]
        })
    }

    fn is_write(&self) -> bool {
        true
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let path = match input["path"].as_str() {
            Some(p) => p,
            None => return ToolResult::error("path is required"),
        };
        let search = match input["search"].as_str() {
            Some(s) => s,
            None => return ToolResult::error("search is required"),
        };
        let replace = match input["replace"].as_str() {
            Some(s) => s,
            None => return ToolResult::error("replace is required"),
        };

        let full_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        if let Err(e) = ctx.check_write_allowed(&full_path) {
            return ToolResult::error(e.to_string());
        }

        let content = match tokio::fs::read_to_string(&full_path).await {
            Ok(c) => c,
            Err(e) => return ToolResult::error(format!("Failed to read file: {}", e)),
        };

        if !content.contains(search) {
            return ToolResult::error(
                "search text not found in file. Make sure it matches exactly, including whitespace.",
            );
        }

        let updated = content.replacen(search, replace, 1);
        if let Err(e) = tokio::fs::write(&full_path, &updated).await {
            return ToolResult::error(format!("Failed to write file: {}", e));
        }

        ctx.record_change(&full_path, FileChange::Modify).await;

        ToolResult::success(format!("Patched {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_apply_patch_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = ApplyPatchTool
            .execute(
                serde_json::json!({
                    "path": "main.go",
                    "search": "func main() {}",
                    "replace": "func main() {\n\tprintln(\"hi\")\n}"
                }),
                &ctx,
            )
            .await;

        assert!(!result.is_error);
        let content = fs::read_to_string(temp.path().join("main.go")).unwrap();
        assert!(content.contains("println"));
    }

    #[tokio::test]
    async fn test_apply_patch_search_not_found() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.go"), "package main\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = ApplyPatchTool
            .execute(
                serde_json::json!({"path": "main.go", "search": "not there", "replace": "x"}),
                &ctx,
            )
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("not found"));
        // File untouched
        assert_eq!(fs::read_to_string(temp.path().join("main.go")).unwrap(), "package main\n");
    }

    #[tokio::test]
    async fn test_apply_patch_replaces_first_occurrence_only() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("f.txt"), "aaa bbb aaa").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = ApplyPatchTool
            .execute(
                serde_json::json!({"path": "f.txt", "search": "aaa", "replace": "ccc"}),
                &ctx,
            )
            .await;

        assert!(!result.is_error);
        assert_eq!(fs::read_to_string(temp.path().join("f.txt")).unwrap(), "ccc bbb aaa");
    }

    #[tokio::test]
    async fn test_apply_patch_respects_allow_list() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.go"), "package b\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_allowed_files(vec!["a.go".to_string()]);

        let result = ApplyPatchTool
            .execute(
                serde_json::json!({"path": "b.go", "search": "package b", "replace": "package c"}),
                &ctx,
            )
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("not in the allowed list"));
        assert_eq!(fs::read_to_string(temp.path().join("b.go")).unwrap(), "package b\n");
    }

    #[tokio::test]
    async fn test_apply_patch_missing_file() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ApplyPatchTool
            .execute(
                serde_json::json!({"path": "ghost.go", "search": "a", "replace": "b"}),
                &ctx,
            )
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("Failed to read"));
    }
}
