//! write_file tool - atomic full-file write

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

use crate::events::FileChange;
use crate::tools::{Tool, ToolContext, ToolResult};

/// Write content to a file, creating parent directories as needed
///
/// The write goes through a temp file in the same directory and a rename,
/// so readers never observe a half-written file.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write complete content to a file. Creates parent directories. Overwrites existing files."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace"
                },
                "content": {
                    "type": "string",
                    "description": "Complete file content to write"
                }
            },
            "required": ["path", "content"]
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

        let content = match input["content"].as_str() {
            Some(c) => c,
            None => return ToolResult::error("content is required"),
        };

        let full_path = match ctx.validate_path(Path::new(path)) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        if let Err(e) = ctx.check_write_allowed(&full_path) {
            debug!(%path, "WriteFileTool::execute: allow-list rejection");
            return ToolResult::error(e.to_string());
        }

        let existed = full_path.exists();

        if let Some(parent) = full_path.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return ToolResult::error(format!("Failed to create directories: {}", e));
        }

        // Atomic overwrite: temp file in the same directory, then rename
        let tmp_path = full_path.with_extension(format!(
            "{}.tmp",
            full_path.extension().map(|e| e.to_string_lossy()).unwrap_or_default()
        ));
        if let Err(e) = tokio::fs::write(&tmp_path, content).await {
            return ToolResult::error(format!("Failed to write file: {}", e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &full_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return ToolResult::error(format!("Failed to write file: {}", e));
        }

        let change = if existed { FileChange::Modify } else { FileChange::Create };
        ctx.record_change(&full_path, change).await;

        ToolResult::success(format!("Wrote {} bytes to {}", content.len(), path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_file_basic() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = WriteFileTool
            .execute(serde_json::json!({"path": "test.txt", "content": "Hello, world!"}), &ctx)
            .await;

        assert!(!result.is_error);
        assert!(result.content.contains("13 bytes"));
        assert_eq!(fs::read_to_string(temp.path().join("test.txt")).unwrap(), "Hello, world!");
    }

    #[tokio::test]
    async fn test_write_file_creates_directories() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = WriteFileTool
            .execute(
                serde_json::json!({"path": "nested/dir/test.txt", "content": "content"}),
                &ctx,
            )
            .await;

        assert!(!result.is_error);
        assert_eq!(
            fs::read_to_string(temp.path().join("nested/dir/test.txt")).unwrap(),
            "content"
        );
    }

    #[tokio::test]
    async fn test_write_file_overwrites_and_tracks_modify() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("test.txt"), "old content").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = WriteFileTool
            .execute(serde_json::json!({"path": "test.txt", "content": "new content"}), &ctx)
            .await;

        assert!(!result.is_error);
        assert_eq!(fs::read_to_string(temp.path().join("test.txt")).unwrap(), "new content");
        assert_eq!(ctx.modified_files().await, vec![PathBuf::from("test.txt")]);
    }

    #[tokio::test]
    async fn test_write_file_allow_list_blocks_and_writes_nothing() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_allowed_files(vec!["a.go".to_string()]);

        let result = WriteFileTool
            .execute(serde_json::json!({"path": "b.go", "content": "package b"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("not in the allowed list"));
        assert!(result.content.contains("a.go"));
        assert!(!temp.path().join("b.go").exists());
        assert!(ctx.modified_files().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_file_outside_workspace() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = WriteFileTool
            .execute(serde_json::json!({"path": "/etc/passwd", "content": "x"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("escapes workspace"));
    }

    #[tokio::test]
    async fn test_write_file_missing_content() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = WriteFileTool.execute(serde_json::json!({"path": "test.txt"}), &ctx).await;

        assert!(result.is_error);
        assert!(result.content.contains("content is required"));
    }
}
