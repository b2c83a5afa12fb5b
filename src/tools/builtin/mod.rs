//! Built-in tools exposed to agents
//!
//! The fixed menu every agent subset draws from: read, list, search,
//! map, write, patch, and shell execution.

mod apply_patch;
mod list_files;
mod project_map;
mod read_file;
mod run_command;
mod search_code;
mod write_file;

pub use apply_patch::ApplyPatchTool;
pub use list_files::ListFilesTool;
pub use project_map::ProjectMapTool;
pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub(crate) use run_command::terminate_gracefully;
pub use search_code::SearchCodeTool;
pub use write_file::WriteFileTool;

/// Directories skipped by listing, mapping, and search tools
pub(crate) const IGNORED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    "tmp",
    "temp",
];

/// Whether a directory entry should be skipped (ignored dirs and dotfiles)
pub(crate) fn is_ignored(entry: &walkdir::DirEntry) -> bool {
    let Some(name) = entry.file_name().to_str() else {
        return true;
    };
    if entry.depth() == 0 {
        return false;
    }
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && IGNORED_DIRS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_ignored_skips_known_dirs() {
        let temp = tempdir().unwrap();
        std::fs::create_dir(temp.path().join("node_modules")).unwrap();
        std::fs::create_dir(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join(".env"), "").unwrap();

        let entries: Vec<_> = walkdir::WalkDir::new(temp.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.depth() > 0)
            .collect();

        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            match name.as_str() {
                "node_modules" | ".env" => assert!(is_ignored(&entry), "{} should be ignored", name),
                "src" => assert!(!is_ignored(&entry)),
                _ => {}
            }
        }
    }
}
