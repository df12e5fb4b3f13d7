//! Synthesized snapshot store
//!
//! Keeps the last synthesized template in `.valheim-stack/template.json` so
//! the next synthesis can be diffed against it.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use valheim_stack_core::Template;

const SNAPSHOT_VERSION: u32 = 1;
pub const STATE_DIR: &str = ".valheim-stack";
const SNAPSHOT_FILE: &str = "template.json";
const SNAPSHOT_BACKUP: &str = "template.json.backup";

/// Last synthesized template with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot file version
    pub version: u32,

    pub stack_name: String,

    pub synthesized_at: DateTime<Utc>,

    pub template: Template,
}

impl Snapshot {
    pub fn new(stack_name: impl Into<String>, template: Template) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            stack_name: stack_name.into(),
            synthesized_at: Utc::now(),
            template,
        }
    }
}

/// Reads and writes snapshot files under a project root
pub struct SnapshotStore {
    project_root: PathBuf,
}

impl SnapshotStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn state_dir(&self) -> PathBuf {
        self.project_root.join(STATE_DIR)
    }

    /// Path of the current snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.state_dir().join(SNAPSHOT_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.state_dir().join(SNAPSHOT_BACKUP)
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        let dir = self.state_dir();
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the last snapshot, if one was written
    pub async fn load(&self) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            tracing::debug!("Snapshot not found, nothing synthesized yet");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(CloudError::StateError(format!(
                "Snapshot version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        tracing::debug!(
            "Loaded snapshot of {} with {} resources",
            snapshot.stack_name,
            snapshot.template.resources.len()
        );
        Ok(Some(snapshot))
    }

    /// Save a snapshot, keeping the previous one as a backup
    pub async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.snapshot_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Rotated previous snapshot to backup");
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved snapshot with {} resources",
            snapshot.template.resources.len()
        );
        Ok(())
    }

    /// Load a template file written by `synth --output`
    pub async fn load_template(path: &Path) -> Result<Template> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}
