// src/ports/attachments.rs

//! Content-addressed blob storage for task attachments.
//!
//! Blobs are keyed by snapshot, task and the blake3 digest of their content:
//!
//! `<root>/<snapshot-id>/<task-id>/<hash>`

use std::path::PathBuf;

use anyhow::{bail, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;
use crate::types::{SnapshotId, TaskId};

/// Compute the hex digest used as the blob key.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` and return their content hash.
    fn put(&self, snapshot: SnapshotId, task: TaskId, bytes: &[u8]) -> Result<String>;
    fn get(&self, snapshot: SnapshotId, task: TaskId, hash: &str) -> Result<Vec<u8>>;
    fn remove(&self, snapshot: SnapshotId, task: TaskId, hash: &str) -> Result<()>;
}

/// Attachment store on top of a [`FileSystem`].
#[derive(Debug, Clone)]
pub struct FileAttachmentStore<F: FileSystem> {
    fs: F,
    root: PathBuf,
}

impl<F: FileSystem> FileAttachmentStore<F> {
    pub fn new(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    fn blob_path(&self, snapshot: SnapshotId, task: TaskId, hash: &str) -> PathBuf {
        self.root
            .join(snapshot.to_string())
            .join(task.to_string())
            .join(hash)
    }
}

impl<F: FileSystem> AttachmentStore for FileAttachmentStore<F> {
    fn put(&self, snapshot: SnapshotId, task: TaskId, bytes: &[u8]) -> Result<String> {
        let hash = content_hash(bytes);
        let path = self.blob_path(snapshot, task, &hash);
        if self.fs.exists(&path) {
            debug!(?path, "attachment already stored");
        } else {
            self.fs.write(&path, bytes)?;
            debug!(?path, size = bytes.len(), "stored attachment");
        }
        Ok(hash)
    }

    fn get(&self, snapshot: SnapshotId, task: TaskId, hash: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(snapshot, task, hash);
        let bytes = self.fs.read(&path)?;
        if content_hash(&bytes) != hash {
            bail!("attachment at {:?} does not match its hash", path);
        }
        Ok(bytes)
    }

    fn remove(&self, snapshot: SnapshotId, task: TaskId, hash: &str) -> Result<()> {
        self.fs.remove_file(&self.blob_path(snapshot, task, hash))
    }
}
