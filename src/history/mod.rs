//! Execution history - append-only JSONL record store
//!
//! One record per terminal attempt, one JSON object per line. Appends are
//! advisory-locked and flushed so concurrent processes can share the log.

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::conductor::ErrorKind;

/// One terminal attempt of an agent against a (backend, model) pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub task: String,
    pub backend: String,
    pub model: String,
    pub agent_role: String,
    pub success: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionRecord {
    /// A successful attempt
    pub fn success(
        task: impl Into<String>,
        backend: impl Into<String>,
        model: impl Into<String>,
        agent_role: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            task: task.into(),
            backend: backend.into(),
            model: model.into(),
            agent_role: agent_role.into(),
            success: true,
            latency_ms,
            error_kind: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed attempt with its error kind
    pub fn failure(
        task: impl Into<String>,
        backend: impl Into<String>,
        model: impl Into<String>,
        agent_role: impl Into<String>,
        latency_ms: u64,
        error_kind: ErrorKind,
    ) -> Self {
        Self {
            task: task.into(),
            backend: backend.into(),
            model: model.into(),
            agent_role: agent_role.into(),
            success: false,
            latency_ms,
            error_kind: Some(error_kind),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only JSONL store at `~/.chuchu/history.jsonl`
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Create a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record, atomically: a record is a single line, the file
    /// is opened append-only, locked for the write, and flushed.
    pub fn append(&self, record: &ExecutionRecord) -> Result<()> {
        debug!(role = %record.agent_role, success = record.success, "HistoryStore::append: called");
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create history directory")?;
        }

        let line = serde_json::to_string(record).context("Failed to serialize execution record")?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context(format!("Failed to open history log {}", self.path.display()))?;

        file.lock_exclusive().context("Failed to lock history log")?;
        let result = writeln!(file, "{}", line).and_then(|_| file.flush());
        let _ = fs2::FileExt::unlock(&file);
        result.context("Failed to append execution record")?;
        Ok(())
    }

    /// Load every parseable record; malformed lines are skipped
    pub fn load(&self) -> Result<Vec<ExecutionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).context("Failed to read history log")?;
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = idx + 1, error = %e, "Skipping malformed history line"),
            }
        }
        Ok(records)
    }

    /// Records for one agent role
    pub fn for_role(&self, role: &str) -> Result<Vec<ExecutionRecord>> {
        Ok(self.load()?.into_iter().filter(|r| r.agent_role == role).collect())
    }

    /// The backing file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
