//! InMemory StateStore 実装
//!
//! ドメイン層が定義する StateStore trait の具体的な実装。
//! HashMap を名前付き blob ストアとして使用します。
//!
//! スナップショットは JSON 文字列として保持するため、
//! ファイル実装と同じシリアライズ経路を通ります。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RoomKey, RoomState, StateStore, StoreError};

/// インメモリ StateStore 実装
///
/// プロセス終了とともに内容は失われます。
#[derive(Default)]
pub struct InMemoryStateStore {
    /// ルームキー → JSON スナップショット
    blobs: Mutex<HashMap<String, String>>,
}

impl InMemoryStateStore {
    /// 新しい InMemoryStateStore を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済み blob の数
    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.lock().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &RoomKey) -> Result<Option<RoomState>, StoreError> {
        let blobs = self.blobs.lock().await;
        blobs
            .get(key.as_str())
            .map(|blob| {
                serde_json::from_str(blob).map_err(|source| StoreError::Serialization {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    async fn save(&self, key: &RoomKey, state: &RoomState) -> Result<(), StoreError> {
        let blob = serde_json::to_string(state).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        let mut blobs = self.blobs.lock().await;
        blobs.insert(key.to_string(), blob);
        Ok(())
    }
}
