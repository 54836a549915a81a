//! File-backed StateStore: one `<room>.json` per room in a directory.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;

use crate::domain::{RoomKey, RoomState, StateStore, StoreError};

pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &RoomKey) -> PathBuf {
        // RoomKey only admits [A-Za-z0-9_-], so it is always a plain file name.
        self.dir.join(format!("{key}.json"))
    }

    fn io_error(key: &RoomKey, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, key: &RoomKey) -> Result<Option<RoomState>, StoreError> {
        let blob = match tokio::fs::read_to_string(self.path(key)).await {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(key, e)),
        };
        serde_json::from_str(&blob)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                key: key.to_string(),
                source,
            })
    }

    async fn save(&self, key: &RoomKey, state: &RoomState) -> Result<(), StoreError> {
        let blob = serde_json::to_vec(state).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_error(key, e))?;

        // Write-then-rename so a crash never leaves a truncated snapshot behind.
        let target = self.path(key);
        let staging = target.with_extension("json.tmp");
        tokio::fs::write(&staging, blob)
            .await
            .map_err(|e| Self::io_error(key, e))?;
        tokio::fs::rename(&staging, &target)
            .await
            .map_err(|e| Self::io_error(key, e))?;
        tracing::debug!("Saved snapshot of room '{}' to {}", key, target.display());
        Ok(())
    }
}
