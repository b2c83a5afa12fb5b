//! search_code tool - in-process grep over the workspace

use async_trait::async_trait;
use grep_regex::RegexMatcher;
use grep_searcher::sinks::UTF8;
use grep_searcher::{BinaryDetection, SearcherBuilder};
use serde_json::Value;
use walkdir::WalkDir;

use crate::tools::{Tool, ToolContext, ToolResult};

use super::is_ignored;

/// Matching lines returned before the output is truncated
const MAX_MATCHES: usize = 50;

/// Search file contents with a regex pattern
pub struct SearchCodeTool;

#[async_trait]
impl Tool for SearchCodeTool {
    fn name(&self) -> &'static str {
        "search_code"
    }

    fn description(&self) -> &'static str {
        "Search file contents for a regex pattern. Optionally filter files by a glob pattern."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern to search for"
                },
                "file_pattern": {
                    "type": "string",
                    "description": "Glob pattern to filter file names, e.g. '*.rs'"
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, input: Value, ctx: &ToolContext) -> ToolResult {
        let pattern = match input["pattern"].as_str() {
            Some(p) => p,
            None => return ToolResult::error("pattern is required"),
        };

        let file_pattern = match input["file_pattern"].as_str() {
            Some(p) => match glob::Pattern::new(p) {
                Ok(pat) => Some(pat),
                Err(e) => return ToolResult::error(format!("Invalid file_pattern '{}': {}", p, e)),
            },
            None => None,
        };

        let matcher = match RegexMatcher::new(pattern) {
            Ok(m) => m,
            Err(e) => return ToolResult::error(format!("Invalid pattern '{}': {}", pattern, e)),
        };

        let mut searcher = SearcherBuilder::new()
            .binary_detection(BinaryDetection::quit(b'\x00'))
            .line_number(true)
            .build();

        let mut matches: Vec<String> = Vec::new();
        let mut total = 0usize;

        let walker = WalkDir::new(&ctx.workspace)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(pat) = &file_pattern {
                let name = entry.file_name().to_string_lossy();
                if !pat.matches(&name) {
                    continue;
                }
            }

            let rel = entry
                .path()
                .strip_prefix(&ctx.workspace)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .to_string();

            let result = searcher.search_path(
                &matcher,
                entry.path(),
                UTF8(|line_number, line| {
                    total += 1;
                    if matches.len() < MAX_MATCHES {
                        matches.push(format!("{}:{}: {}", rel, line_number, line.trim_end()));
                    }
                    Ok(true)
                }),
            );

            if result.is_err() {
                // Unreadable or binary file, skip it
                continue;
            }
        }

        if total == 0 {
            return ToolResult::success("No matches found");
        }

        let mut output = matches.join("\n");
        if total > MAX_MATCHES {
            output.push_str(&format!("\n... ({} more matches)", total - MAX_MATCHES));
        }
        ToolResult::success(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_search_finds_matches_with_line_numbers() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.go"), "package main\n\nfunc Divide(a, b int) int {\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = SearchCodeTool
            .execute(serde_json::json!({"pattern": "func Divide"}), &ctx)
            .await;

        assert!(!result.is_error);
        assert!(result.content.contains("main.go:3: func Divide"));
    }

    #[tokio::test]
    async fn test_search_no_matches() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("main.go"), "package main\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = SearchCodeTool
            .execute(serde_json::json!({"pattern": "does_not_exist"}), &ctx)
            .await;

        assert!(!result.is_error);
        assert_eq!(result.content, "No matches found");
    }

    #[tokio::test]
    async fn test_search_respects_file_pattern() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.go"), "needle\n").unwrap();
        fs::write(temp.path().join("b.py"), "needle\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = SearchCodeTool
            .execute(serde_json::json!({"pattern": "needle", "file_pattern": "*.go"}), &ctx)
            .await;

        assert!(result.content.contains("a.go"));
        assert!(!result.content.contains("b.py"));
    }

    #[tokio::test]
    async fn test_search_skips_ignored_dirs() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("target")).unwrap();
        fs::write(temp.path().join("target/gen.rs"), "needle\n").unwrap();
        fs::write(temp.path().join("lib.rs"), "needle\n").unwrap();

        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = SearchCodeTool
            .execute(serde_json::json!({"pattern": "needle"}), &ctx)
            .await;

        assert!(result.content.contains("lib.rs"));
        assert!(!result.content.contains("gen.rs"));
    }

    #[tokio::test]
    async fn test_search_invalid_pattern() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());
        let result = SearchCodeTool
            .execute(serde_json::json!({"pattern": "(unclosed"}), &ctx)
            .await;

        assert!(result.is_error);
        assert!(result.content.contains("Invalid pattern"));
    }
}
