//! ToolContext - execution context for tools
//!
//! Every agent run gets a `ToolContext` scoped to the workspace root.
//! Tools cannot read or write outside the workspace, editor writes can be
//! restricted to an allow-list, and every mutation is tracked so the
//! conductor knows which files to verify and checkpoint.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::events::{EventEmitter, FileChange};

use super::ToolError;

/// Default timeout for shell commands run by tools
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Execution context for tools - scoped to a single agent run
#[derive(Clone)]
pub struct ToolContext {
    /// Workspace root - all file ops constrained here
    pub workspace: PathBuf,

    /// Run ID (for events)
    pub run_id: String,

    /// When set, write tools may only touch these paths
    allowed_files: Option<Vec<String>>,

    /// Files changed by write tools this run, workspace-relative
    changes: Arc<Mutex<BTreeMap<PathBuf, FileChange>>>,

    /// Optional emitter for file_modified / tool_call events
    pub emitter: Option<EventEmitter>,

    /// Timeout for shell commands
    pub command_timeout: Duration,

    /// Cancellation signal from the enclosing request
    pub cancel: CancellationToken,
}

impl ToolContext {
    /// Create a new tool context
    pub fn new(workspace: PathBuf, run_id: String) -> Self {
        debug!(?workspace, %run_id, "ToolContext::new: called");
        Self {
            workspace,
            run_id,
            allowed_files: None,
            changes: Arc::new(Mutex::new(BTreeMap::new())),
            emitter: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    /// Restrict write tools to an allow-list of workspace-relative paths
    pub fn with_allowed_files(mut self, allowed: Vec<String>) -> Self {
        debug!(count = allowed.len(), "ToolContext::with_allowed_files: called");
        self.allowed_files = Some(allowed);
        self
    }

    /// Attach an event emitter
    pub fn with_emitter(mut self, emitter: EventEmitter) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Override the shell command timeout
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The allow-list, if one is set
    pub fn allowed_files(&self) -> Option<&[String]> {
        self.allowed_files.as_deref()
    }

    /// Normalize a path relative to the workspace
    fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate a path stays inside the workspace (sandbox enforcement)
    ///
    /// Existing paths are canonicalized to resolve symlinks; new paths are
    /// checked through their nearest existing parent.
    pub fn validate_path(&self, path: &Path) -> Result<PathBuf, ToolError> {
        let normalized = self.normalize_path(path);

        let canonical = if normalized.exists() {
            normalized.canonicalize().unwrap_or_else(|_| normalized.clone())
        } else if let Some(parent) = normalized.parent() {
            if parent.exists() {
                let canonical_parent = parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf());
                canonical_parent.join(normalized.file_name().unwrap_or_default())
            } else {
                normalized.clone()
            }
        } else {
            normalized.clone()
        };

        let workspace_canonical = self.workspace.canonicalize().unwrap_or_else(|_| self.workspace.clone());

        if canonical.starts_with(&workspace_canonical) {
            Ok(canonical)
        } else {
            debug!(?path, "ToolContext::validate_path: sandbox violation");
            Err(ToolError::SandboxViolation {
                path: path.to_path_buf(),
                workspace: self.workspace.clone(),
            })
        }
    }

    /// Check a validated path against the write allow-list
    ///
    /// An entry matches on exact workspace-relative path, or on bare file
    /// name when the entry has no directory component (plans usually
    /// mention files by name).
    pub fn check_write_allowed(&self, full_path: &Path) -> Result<(), ToolError> {
        let Some(allowed) = &self.allowed_files else {
            return Ok(());
        };

        let rel = self.relative(full_path);
        let rel_str = rel.to_string_lossy();
        let file_name = full_path.file_name().map(|n| n.to_string_lossy().to_string());

        let matched = allowed.iter().any(|entry| {
            let entry_norm = entry.trim_start_matches("./");
            if entry_norm == rel_str {
                return true;
            }
            !entry_norm.contains('/') && file_name.as_deref() == Some(entry_norm)
        });

        if matched {
            Ok(())
        } else {
            debug!(path = %rel_str, "ToolContext::check_write_allowed: rejected");
            Err(ToolError::WriteNotAllowed {
                path: rel_str.to_string(),
                allowed: allowed.clone(),
            })
        }
    }

    /// Record a file change and emit a file_modified event
    pub async fn record_change(&self, full_path: &Path, change: FileChange) {
        let rel = self.relative(full_path);
        debug!(path = ?rel, %change, "ToolContext::record_change: called");
        if let Some(emitter) = &self.emitter {
            emitter.file_modified(&rel.to_string_lossy(), change);
        }
        let mut changes = self.changes.lock().await;
        // A create followed by a modify stays a create
        changes.entry(rel).or_insert(change);
    }

    /// Files changed by write tools so far, workspace-relative
    pub async fn modified_files(&self) -> Vec<PathBuf> {
        self.changes.lock().await.keys().cloned().collect()
    }

    /// Clear change tracking (called between conductor attempts)
    pub async fn clear_changes(&self) {
        self.changes.lock().await.clear();
    }

    /// A path relative to the workspace (falls back to the input)
    fn relative(&self, path: &Path) -> PathBuf {
        let workspace_canonical = self.workspace.canonicalize().unwrap_or_else(|_| self.workspace.clone());
        path.strip_prefix(&workspace_canonical)
            .or_else(|_| path.strip_prefix(&self.workspace))
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("workspace", &self.workspace)
            .field("run_id", &self.run_id)
            .field("allowed_files", &self.allowed_files)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_validate_path_within_workspace() {
        let temp = tempdir().unwrap();
        let workspace = temp.path().to_path_buf();
        fs::write(workspace.join("test.txt"), "content").unwrap();

        let ctx = ToolContext::new(workspace, "test".to_string());
        assert!(ctx.validate_path(Path::new("test.txt")).is_ok());
    }

    #[tokio::test]
    async fn test_validate_path_outside_workspace() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ctx.validate_path(Path::new("/etc/passwd"));
        assert!(matches!(result.unwrap_err(), ToolError::SandboxViolation { .. }));
    }

    #[tokio::test]
    async fn test_validate_path_traversal() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let result = ctx.validate_path(Path::new("../../../etc/passwd"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_validate_new_file_path() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        assert!(ctx.validate_path(Path::new("new_file.txt")).is_ok());
    }

    #[tokio::test]
    async fn test_allow_list_exact_match() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_allowed_files(vec!["a.go".to_string()]);

        let ok = ctx.validate_path(Path::new("a.go")).unwrap();
        assert!(ctx.check_write_allowed(&ok).is_ok());

        let bad = ctx.validate_path(Path::new("b.go")).unwrap();
        let err = ctx.check_write_allowed(&bad).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("b.go"));
        assert!(msg.contains("a.go"));
    }

    #[tokio::test]
    async fn test_allow_list_bare_name_matches_nested_path() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("pkg")).unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string())
            .with_allowed_files(vec!["utils.go".to_string()]);

        let nested = ctx.validate_path(Path::new("pkg/utils.go")).unwrap();
        assert!(ctx.check_write_allowed(&nested).is_ok());
    }

    #[tokio::test]
    async fn test_no_allow_list_permits_everything() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let path = ctx.validate_path(Path::new("anything.rs")).unwrap();
        assert!(ctx.check_write_allowed(&path).is_ok());
    }

    #[tokio::test]
    async fn test_record_and_list_changes() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path().to_path_buf(), "test".to_string());

        let a = ctx.validate_path(Path::new("a.go")).unwrap();
        let b = ctx.validate_path(Path::new("b.go")).unwrap();
        ctx.record_change(&a, FileChange::Create).await;
        ctx.record_change(&b, FileChange::Modify).await;
        ctx.record_change(&a, FileChange::Modify).await;

        let files = ctx.modified_files().await;
        assert_eq!(files, vec![PathBuf::from("a.go"), PathBuf::from("b.go")]);

        ctx.clear_changes().await;
        assert!(ctx.modified_files().await.is_empty());
    }
}
