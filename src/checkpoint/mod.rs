//! Checkpoints - file-snapshot sets with copy-back rollback
//!
//! A checkpoint is a byte-for-byte copy of the files written in a
//! successful step, stored under `<workspace>/.chuchu/checkpoints/<id>/`.
//! No deltas: rollback is a plain copy back into the workspace.

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Checkpoint metadata, persisted as `manifest.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// `ckpt_<step>_<unix-ns>`
    pub id: String,

    /// Conductor step index this snapshot belongs to
    pub step_index: u32,

    /// Snapshotted files, workspace-relative
    pub files: Vec<PathBuf>,

    pub created_at: DateTime<Utc>,
}

/// Stores and restores per-step snapshots
pub struct CheckpointStore {
    workspace: PathBuf,
    root: PathBuf,
}

impl CheckpointStore {
    /// Create a store rooted under the workspace
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let root = workspace.join(".chuchu").join("checkpoints");
        Self { workspace, root }
    }

    /// The directory holding one checkpoint
    fn checkpoint_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Snapshot the given files after a successful verify
    ///
    /// Files that no longer exist on disk are skipped (a step may have
    /// deleted something it previously wrote).
    pub fn save(&self, step_index: u32, files: &[PathBuf]) -> Result<Checkpoint> {
        let created_at = Utc::now();
        let nanos = created_at.timestamp_nanos_opt().unwrap_or_default();
        let id = format!("ckpt_{}_{}", step_index, nanos);
        debug!(%id, file_count = files.len(), "CheckpointStore::save: called");

        let dir = self.checkpoint_dir(&id);
        let files_dir = dir.join("files");
        std::fs::create_dir_all(&files_dir).context("Failed to create checkpoint directory")?;

        let mut snapshotted = Vec::new();
        for rel in files {
            let src = self.workspace.join(rel);
            if !src.exists() {
                debug!(file = ?rel, "CheckpointStore::save: file missing, skipping");
                continue;
            }
            let dst = files_dir.join(rel);
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent).context("Failed to create snapshot subdirectory")?;
            }
            std::fs::copy(&src, &dst).context(format!("Failed to snapshot {}", rel.display()))?;
            snapshotted.push(rel.clone());
        }

        let checkpoint = Checkpoint {
            id: id.clone(),
            step_index,
            files: snapshotted,
            created_at,
        };

        let manifest = serde_json::to_string_pretty(&checkpoint).context("Failed to serialize manifest")?;
        std::fs::write(dir.join("manifest.json"), manifest).context("Failed to write manifest")?;

        info!(%id, files = checkpoint.files.len(), "Checkpoint saved");
        Ok(checkpoint)
    }

    /// Restore every file in a checkpoint into the workspace
    pub fn rollback(&self, checkpoint: &Checkpoint) -> Result<usize> {
        debug!(id = %checkpoint.id, "CheckpointStore::rollback: called");
        let files_dir = self.checkpoint_dir(&checkpoint.id).join("files");

        let mut restored = 0;
        for rel in &checkpoint.files {
            let src = files_dir.join(rel);
            let dst = self.workspace.join(rel);
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent).context("Failed to create workspace subdirectory")?;
            }
            std::fs::copy(&src, &dst).context(format!("Failed to restore {}", rel.display()))?;
            restored += 1;
        }

        info!(id = %checkpoint.id, restored, "Rolled back to checkpoint");
        Ok(restored)
    }

    /// Load a checkpoint by id
    pub fn load(&self, id: &str) -> Result<Checkpoint> {
        let manifest = self.checkpoint_dir(id).join("manifest.json");
        let json = std::fs::read_to_string(&manifest)
            .context(format!("Failed to read manifest {}", manifest.display()))?;
        serde_json::from_str(&json).context("Failed to parse checkpoint manifest")
    }

    /// The most recently created checkpoint, if any
    pub fn latest(&self) -> Result<Option<Checkpoint>> {
        if !self.root.exists() {
            return Ok(None);
        }

        let mut checkpoints = Vec::new();
        for entry in std::fs::read_dir(&self.root).context("Failed to read checkpoints directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = entry.file_name().to_string_lossy().to_string();
            match self.load(&id) {
                Ok(ckpt) => checkpoints.push(ckpt),
                Err(e) => debug!(%id, error = %e, "CheckpointStore::latest: unreadable manifest, skipping"),
            }
        }

        checkpoints.sort_by_key(|c| c.created_at);
        Ok(checkpoints.pop())
    }

    /// Where snapshots live (for tests and drivers)
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_copies_bytes_exactly() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("utils.go"), "package utils\n\nfunc Divide() {}\n").unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/guide.md"), "# Guide\n").unwrap();

        let store = CheckpointStore::new(temp.path());
        let ckpt = store
            .save(1, &[PathBuf::from("utils.go"), PathBuf::from("docs/guide.md")])
            .unwrap();

        assert!(ckpt.id.starts_with("ckpt_1_"));
        assert_eq!(ckpt.files.len(), 2);

        let snapshot = store.root().join(&ckpt.id).join("files/utils.go");
        assert_eq!(
            fs::read(snapshot).unwrap(),
            fs::read(temp.path().join("utils.go")).unwrap()
        );
        assert!(store.root().join(&ckpt.id).join("manifest.json").exists());
    }

    #[test]
    fn test_rollback_restores_snapshot_bytes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("utils.go"), "original content").unwrap();

        let store = CheckpointStore::new(temp.path());
        let ckpt = store.save(1, &[PathBuf::from("utils.go")]).unwrap();

        // A later attempt breaks the file
        fs::write(temp.path().join("utils.go"), "broken content").unwrap();

        let restored = store.rollback(&ckpt).unwrap();
        assert_eq!(restored, 1);
        assert_eq!(fs::read_to_string(temp.path().join("utils.go")).unwrap(), "original content");
    }

    #[test]
    fn test_save_skips_missing_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("real.go"), "x").unwrap();

        let store = CheckpointStore::new(temp.path());
        let ckpt = store.save(2, &[PathBuf::from("real.go"), PathBuf::from("ghost.go")]).unwrap();

        assert_eq!(ckpt.files, vec![PathBuf::from("real.go")]);
    }

    #[test]
    fn test_latest_returns_newest() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("f.go"), "v1").unwrap();

        let store = CheckpointStore::new(temp.path());
        let first = store.save(1, &[PathBuf::from("f.go")]).unwrap();

        fs::write(temp.path().join("f.go"), "v2").unwrap();
        let second = store.save(2, &[PathBuf::from("f.go")]).unwrap();

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_ne!(latest.id, first.id);
    }

    #[test]
    fn test_latest_empty_store() {
        let temp = tempdir().unwrap();
        let store = CheckpointStore::new(temp.path());
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_load_round_trip() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.rb"), "puts 'hi'").unwrap();

        let store = CheckpointStore::new(temp.path());
        let saved = store.save(3, &[PathBuf::from("a.rb")]).unwrap();
        let loaded = store.load(&saved.id).unwrap();

        assert_eq!(loaded.id, saved.id);
        assert_eq!(loaded.step_index, 3);
        assert_eq!(loaded.files, saved.files);
    }
}
