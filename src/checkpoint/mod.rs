//! Durable snapshots written at the pipeline's stage boundaries.
//!
//! Every checkpoint is a parquet file under the output directory. Files are
//! written to a temporary name and renamed into place, and each write is
//! recorded with its digest in `manifest.json` so a reader can tell whether a
//! snapshot was altered after the run.

pub mod codec;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::{CHECKPOINT_EXTENSION, MANIFEST_FILE};
use crate::error::{PrepError, Result};
use crate::metrics;
use crate::types::{ConversationRecord, MessageRecord, Snapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub name: String,
    pub file: String,
    pub rows: usize,
    pub columns: Vec<String>,
    pub bytes: u64,
    pub sha256: String,
    pub written_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub target_account: String,
    pub target_language: String,
    pub checkpoints: Vec<CheckpointEntry>,
}

impl Manifest {
    pub fn new(target_account: &str, target_language: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            target_account: target_account.to_string(),
            target_language: target_language.to_string(),
            checkpoints: Vec::new(),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&CheckpointEntry> {
        self.checkpoints.iter().find(|e| e.name == name)
    }

    fn record(&mut self, entry: CheckpointEntry) {
        self.checkpoints.retain(|e| e.name != entry.name);
        self.checkpoints.push(entry);
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Checkpoint files for one output directory
#[derive(Debug)]
pub struct CheckpointStore {
    root: PathBuf,
    manifest: Option<Manifest>,
}

impl CheckpointStore {
    /// Start a new run. Existing checkpoints in `root` are overwritten as the
    /// run reaches them. A manifest left by an earlier run is removed first so
    /// it never vouches for files this run rewrites.
    pub fn create<P: Into<PathBuf>>(root: P, manifest: Manifest) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let stale = root.join(MANIFEST_FILE);
        if stale.exists() {
            fs::remove_file(&stale)?;
            info!(path = %stale.display(), "Removed manifest from previous run");
        }
        Ok(Self {
            root,
            manifest: Some(manifest),
        })
    }

    /// Open the output of a previous run for reading. A missing manifest is
    /// tolerated; snapshots are then loaded without digest verification.
    pub fn open<P: Into<PathBuf>>(root: P) -> Result<Self> {
        let root = root.into();
        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let content = fs::read_to_string(&manifest_path)?;
            Some(serde_json::from_str(&content)?)
        } else {
            warn!(dir = %root.display(), "No manifest found, checkpoint digests will not be verified");
            None
        };
        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, CHECKPOINT_EXTENSION))
    }

    pub fn write_messages(&mut self, name: &str, rows: &[MessageRecord]) -> Result<CheckpointEntry> {
        let path = self.path_for(name);
        let tmp = tmp_path(&path);
        codec::write_messages(&tmp, rows)?;
        self.commit(name, &tmp, &path, rows.len(), &codec::MESSAGE_COLUMNS)
    }

    pub fn write_conversations(
        &mut self,
        name: &str,
        rows: &[ConversationRecord],
    ) -> Result<CheckpointEntry> {
        let path = self.path_for(name);
        let tmp = tmp_path(&path);
        codec::write_conversations(&tmp, rows)?;
        self.commit(name, &tmp, &path, rows.len(), &codec::CONVERSATION_COLUMNS)
    }

    fn commit(
        &mut self,
        name: &str,
        tmp: &Path,
        path: &Path,
        rows: usize,
        columns: &[&str],
    ) -> Result<CheckpointEntry> {
        let bytes = fs::read(tmp)?;
        let entry = CheckpointEntry {
            name: name.to_string(),
            file: path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default(),
            rows,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            bytes: bytes.len() as u64,
            sha256: sha256_hex(&bytes),
            written_at: Utc::now(),
        };
        fs::rename(tmp, path)?;

        metrics::checkpoint_written(name, entry.bytes);
        info!(
            checkpoint = name,
            rows,
            bytes = entry.bytes,
            path = %path.display(),
            "Wrote checkpoint"
        );
        if let Some(manifest) = self.manifest.as_mut() {
            manifest.record(entry.clone());
        }
        Ok(entry)
    }

    /// Load a snapshot by name, verifying its digest when the manifest lists it
    pub fn read(&self, name: &str) -> Result<Snapshot> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(PrepError::checkpoint(format!(
                "checkpoint '{}' not found at {}",
                name,
                path.display()
            )));
        }
        if let Some(entry) = self.manifest.as_ref().and_then(|m| m.entry(name)) {
            let actual = sha256_hex(&fs::read(&path)?);
            if actual != entry.sha256 {
                return Err(PrepError::checkpoint(format!(
                    "checkpoint '{}' digest mismatch: manifest {} but file is {}",
                    name, entry.sha256, actual
                )));
            }
            debug!(checkpoint = name, "Digest verified");
        }
        codec::read_snapshot(&path)
    }

    /// Column names of a written checkpoint
    pub fn columns(&self, name: &str) -> Result<Vec<String>> {
        codec::read_columns(&self.path_for(name))
    }

    /// Stamp the finish time and persist the manifest
    pub fn finish(&mut self) -> Result<PathBuf> {
        let manifest = self
            .manifest
            .as_mut()
            .ok_or_else(|| PrepError::checkpoint("checkpoint store was opened read-only"))?;
        manifest.finished_at = Some(Utc::now());

        let path = self.root.join(MANIFEST_FILE);
        let tmp = tmp_path(&path);
        fs::write(&tmp, serde_json::to_string_pretty(manifest)?)?;
        fs::rename(&tmp, &path)?;
        info!(run_id = %manifest.run_id, path = %path.display(), "Wrote run manifest");
        Ok(path)
    }
}
