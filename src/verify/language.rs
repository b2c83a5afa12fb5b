//! Language probe and per-language check commands
//!
//! Verifier selection is driven by the extensions of the files touched
//! since the last checkpoint. A file with no recognized code extension
//! contributes nothing, so documentation-only changes verify as a no-op.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Languages the verifier set knows how to build and test
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Language {
    Go,
    JavaScript,
    Python,
    Elixir,
    Ruby,
}

impl Language {
    /// Probe by file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "go" => Some(Language::Go),
            "ts" | "js" | "jsx" | "tsx" => Some(Language::JavaScript),
            "py" => Some(Language::Python),
            "ex" | "exs" => Some(Language::Elixir),
            "rb" => Some(Language::Ruby),
            _ => None,
        }
    }

    /// Lowercase language name
    pub fn name(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Elixir => "elixir",
            Language::Ruby => "ruby",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Languages present in a modified-files set
pub fn detect_languages(files: &[PathBuf]) -> BTreeSet<Language> {
    files
        .iter()
        .filter_map(|f| f.extension().and_then(|e| e.to_str()))
        .filter_map(Language::from_extension)
        .collect()
}

/// One shell check scoped to a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckCommand {
    pub command: String,
    pub dir: PathBuf,
}

impl CheckCommand {
    fn new(command: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            dir: dir.into(),
        }
    }
}

/// Walk up from a modified file to the nearest directory containing a
/// marker file, stopping at the workspace root
fn enclosing_dir_with(workspace: &Path, file: &Path, marker: &str) -> Option<PathBuf> {
    let abs = if file.is_absolute() {
        file.to_path_buf()
    } else {
        workspace.join(file)
    };

    let mut dir = abs.parent()?.to_path_buf();
    loop {
        if dir.join(marker).exists() {
            return Some(dir);
        }
        if dir == workspace {
            return None;
        }
        match dir.parent() {
            Some(parent) if parent.starts_with(workspace) => dir = parent.to_path_buf(),
            _ => return None,
        }
    }
}

/// Unique scope directories for a language marker, workspace root when none
fn scope_dirs(workspace: &Path, files: &[PathBuf], ext_filter: &[&str], marker: &str) -> Vec<PathBuf> {
    let mut dirs: BTreeSet<PathBuf> = files
        .iter()
        .filter(|f| {
            f.extension()
                .and_then(|e| e.to_str())
                .map(|e| ext_filter.contains(&e))
                .unwrap_or(false)
        })
        .filter_map(|f| enclosing_dir_with(workspace, f, marker))
        .collect();

    if dirs.is_empty() {
        dirs.insert(workspace.to_path_buf());
    }
    dirs.into_iter().collect()
}

/// Build commands for a language over the modified set
pub fn build_commands(language: Language, workspace: &Path, files: &[PathBuf]) -> Vec<CheckCommand> {
    match language {
        Language::Go => scope_dirs(workspace, files, &["go"], "go.mod")
            .into_iter()
            .map(|dir| CheckCommand::new("go build ./...", dir))
            .collect(),
        Language::JavaScript => scope_dirs(workspace, files, &["ts", "js", "jsx", "tsx"], "package.json")
            .into_iter()
            .map(|dir| CheckCommand::new("npm run build", dir))
            .collect(),
        Language::Python => {
            let py_files: Vec<String> = files
                .iter()
                .filter(|f| f.extension().and_then(|e| e.to_str()) == Some("py"))
                .map(|f| f.to_string_lossy().to_string())
                .collect();
            if py_files.is_empty() {
                return vec![];
            }
            vec![CheckCommand::new(
                format!("python -m py_compile {}", py_files.join(" ")),
                workspace,
            )]
        }
        Language::Elixir => vec![CheckCommand::new("mix compile", workspace)],
        Language::Ruby => vec![],
    }
}

/// Test commands for a language over the modified set
pub fn test_commands(language: Language, workspace: &Path, files: &[PathBuf]) -> Vec<CheckCommand> {
    match language {
        Language::Go => scope_dirs(workspace, files, &["go"], "go.mod")
            .into_iter()
            .map(|dir| CheckCommand::new("go test ./...", dir))
            .collect(),
        Language::JavaScript => scope_dirs(workspace, files, &["ts", "js", "jsx", "tsx"], "package.json")
            .into_iter()
            .map(|dir| CheckCommand::new("npm test", dir))
            .collect(),
        Language::Python => {
            // pytest only when the project actually carries a test setup
            if workspace.join("pytest.ini").exists() || workspace.join("setup.py").exists() {
                vec![CheckCommand::new("pytest", workspace)]
            } else {
                vec![]
            }
        }
        Language::Elixir => vec![CheckCommand::new("mix test", workspace)],
        Language::Ruby => {
            if workspace.join("Gemfile").exists() {
                vec![CheckCommand::new("bundle exec rspec", workspace)]
            } else {
                vec![CheckCommand::new("rspec", workspace)]
            }
        }
    }
}
