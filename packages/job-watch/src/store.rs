//! Durable storage for the stored snapshot.
//!
//! The store is the only owner of the durable copy. The coordinator and the
//! reconciler only ever hold transient in-memory snapshots.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::record::Snapshot;

/// Durable read/write of the full set of previously known records.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot.
    ///
    /// When nothing has been stored yet, durable state is initialized to an
    /// empty snapshot and the empty snapshot is returned. This is the only
    /// case in which `load` writes.
    async fn load(&self) -> StorageResult<Snapshot>;

    /// Replace the stored snapshot.
    ///
    /// Readers observe either the previous snapshot or the new one, never a
    /// mix. On error the previous snapshot is still in place.
    async fn save(&self, snapshot: &Snapshot) -> StorageResult<()>;

    /// Store name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Snapshot store backed by one human-readable JSON file.
///
/// Writes go to a sibling `<file>.tmp`, are synced, then renamed over the
/// target, so a crash mid-write leaves the old file in place. The directory is
/// synced after the rename so the new entry itself survives a power loss.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    async fn write_atomically(&self, bytes: &[u8]) -> StorageResult<()> {
        let parent = self.parent_dir();
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;

        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::io(&temp_path, e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            warn!(path = %self.path.display(), error = %e, "Snapshot rename failed");
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::io(&self.path, e));
        }

        sync_dir(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))
    }
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::File::open(dir).await?.sync_all().await
}

// Directories cannot be opened as files here; rename durability is left to
// the filesystem.
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

fn encode(snapshot: &Snapshot) -> StorageResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(snapshot)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load(&self) -> StorageResult<Snapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No stored snapshot, initializing empty state");
                let empty = Snapshot::new();
                self.write_atomically(&encode(&empty)?).await?;
                return Ok(empty);
            }
            Err(e) => return Err(StorageError::io(&self.path, e)),
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), records = snapshot.len(), "Loaded snapshot");
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &Snapshot) -> StorageResult<()> {
        let bytes = encode(snapshot)?;
        self.write_atomically(&bytes).await?;

        debug!(path = %self.path.display(), records = snapshot.len(), "Saved snapshot");
        Ok(())
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_sibling() {
        let store = JsonFileStore::new("/var/lib/job-watch/jobs.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/var/lib/job-watch/jobs.json.tmp")
        );
    }

    #[test]
    fn test_bare_file_name_lives_in_current_dir() {
        let store = JsonFileStore::new("jobs.json");
        assert_eq!(store.parent_dir(), Path::new("."));
    }

    #[tokio::test]
    async fn test_sync_dir_on_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(sync_dir(dir.path()).await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sync_dir_on_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = sync_dir(&dir.path().join("gone")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_encode_is_newline_terminated_array() {
        let bytes = encode(&Snapshot::new()).unwrap();
        assert_eq!(bytes, b"[]\n");
    }
}
