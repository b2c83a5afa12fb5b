//! Symphony and movement types
//!
//! A symphony is the decomposition of one complex task into ordered
//! movements. State is persisted after every movement transition so a
//! driver can resume an interrupted run.

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// One ordered sub-task of a symphony
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Random 16-hex identifier
    pub id: String,

    /// Short display name
    pub name: String,

    /// The sub-task text handed to the conductor
    pub goal: String,

    pub status: MovementStatus,
}

impl Movement {
    /// Create a pending movement with a fresh id
    pub fn new(name: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            id: format!("{:016x}", rand::rng().random::<u64>()),
            name: name.into(),
            goal: goal.into(),
            status: MovementStatus::Pending,
        }
    }
}

/// Movement lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

/// Symphony lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymphonyStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

/// A decomposed complex task and its execution state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symphony {
    pub id: String,
    pub task: String,
    pub movements: Vec<Movement>,
    pub current_movement_index: usize,
    pub status: SymphonyStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Symphony {
    /// Create a pending symphony for a task
    pub fn new(task: impl Into<String>, movements: Vec<Movement>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            task: task.into(),
            movements,
            current_movement_index: 0,
            status: SymphonyStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The state file path for this symphony under the given directory
    pub fn state_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", self.id))
    }

    /// Persist the symphony state
    ///
    /// Called after every movement transition; writes through a temp file
    /// so a crash never leaves a torn state file.
    pub fn save(&self, dir: &Path) -> Result<()> {
        debug!(id = %self.id, status = ?self.status, "Symphony::save: called");
        std::fs::create_dir_all(dir).context("Failed to create symphonies directory")?;

        let path = self.state_path(dir);
        let json = serde_json::to_string_pretty(self).context("Failed to serialize symphony")?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).context("Failed to write symphony state")?;
        std::fs::rename(&tmp, &path).context("Failed to commit symphony state")?;
        Ok(())
    }

    /// Load a symphony from its state file
    pub fn load(dir: &Path, id: &str) -> Result<Self> {
        let path = dir.join(format!("{}.json", id));
        let json = std::fs::read_to_string(&path)
            .context(format!("Failed to read symphony state {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to parse symphony state")
    }
}

/// Edit verbs that mark a movement goal as mutating
const EDIT_KEYWORDS: &[&str] = &[
    "modify",
    "write",
    "create",
    "update",
    "delete",
    "change",
    "edit",
    "add",
    "remove",
    "refactor",
    "implement",
    "fix the code",
    "fix bug",
];

/// Whether every movement goal is read-only
pub fn goals_read_only(movements: &[Movement]) -> bool {
    movements.iter().all(|m| {
        let goal = m.goal.to_lowercase();
        !EDIT_KEYWORDS.iter().any(|k| goal.contains(k))
    })
}

/// Drop display-only movements that trail an execution movement
///
/// A goal starting with "display"/"show" directly after a goal starting
/// with "run"/"execute"/"retrieve" is redundant: the execution movement
/// already produces the display.
pub fn collapse_display(movements: Vec<Movement>) -> Vec<Movement> {
    let mut collapsed: Vec<Movement> = Vec::with_capacity(movements.len());

    for movement in movements {
        let goal = movement.goal.trim().to_lowercase();
        let is_display = goal.starts_with("display") || goal.starts_with("show");

        let previous_executes = collapsed.last().map(|prev: &Movement| {
            let prev_goal = prev.goal.trim().to_lowercase();
            prev_goal.starts_with("run") || prev_goal.starts_with("execute") || prev_goal.starts_with("retrieve")
        });

        if is_display && previous_executes == Some(true) {
            debug!(goal = %movement.goal, "collapse_display: dropping display movement");
            continue;
        }
        collapsed.push(movement);
    }

    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_movement_id_is_16_hex() {
        let movement = Movement::new("build", "run the build");
        assert_eq!(movement.id.len(), 16);
        assert!(movement.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(movement.status, MovementStatus::Pending);
    }

    #[test]
    fn test_movement_ids_are_unique() {
        let a = Movement::new("a", "goal a");
        let b = Movement::new("b", "goal b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_collapse_drops_display_after_run() {
        let movements = vec![
            Movement::new("run", "run tests"),
            Movement::new("display", "display test results"),
        ];

        let collapsed = collapse_display(movements);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].goal, "run tests");
    }

    #[test]
    fn test_collapse_keeps_display_after_write() {
        let movements = vec![
            Movement::new("write", "write file A"),
            Movement::new("display", "display file A"),
        ];

        let collapsed = collapse_display(movements);
        assert_eq!(collapsed.len(), 2);
    }

    #[test]
    fn test_collapse_handles_execute_and_retrieve() {
        let movements = vec![
            Movement::new("retrieve", "retrieve the metrics"),
            Movement::new("show", "show the metrics"),
            Movement::new("execute", "execute the migration"),
            Movement::new("display", "display migration output"),
        ];

        let collapsed = collapse_display(movements);
        assert_eq!(collapsed.len(), 2);
        assert_eq!(collapsed[0].goal, "retrieve the metrics");
        assert_eq!(collapsed[1].goal, "execute the migration");
    }

    #[test]
    fn test_goals_read_only() {
        let read_only = vec![
            Movement::new("a", "list the files in docs"),
            Movement::new("b", "show the summary"),
        ];
        assert!(goals_read_only(&read_only));

        let mutating = vec![
            Movement::new("a", "list the files in docs"),
            Movement::new("b", "update the README"),
        ];
        assert!(!goals_read_only(&mutating));
    }

    #[test]
    fn test_symphony_save_and_load_round_trip() {
        let temp = tempdir().unwrap();
        let mut symphony = Symphony::new(
            "reorganize docs",
            vec![Movement::new("move", "create features/ directory")],
        );
        symphony.status = SymphonyStatus::Executing;
        symphony.movements[0].status = MovementStatus::Completed;
        symphony.current_movement_index = 1;

        symphony.save(temp.path()).unwrap();

        let loaded = Symphony::load(temp.path(), &symphony.id).unwrap();
        assert_eq!(loaded.task, "reorganize docs");
        assert_eq!(loaded.status, SymphonyStatus::Executing);
        assert_eq!(loaded.current_movement_index, 1);
        assert_eq!(loaded.movements[0].status, MovementStatus::Completed);
    }

    #[test]
    fn test_symphony_load_missing() {
        let temp = tempdir().unwrap();
        assert!(Symphony::load(temp.path(), "nope").is_err());
    }
}
