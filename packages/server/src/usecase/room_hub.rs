//! UseCase: ルームの集合
//!
//! ルームキーごとに RoomWorker を遅延起動し、その送信口を配ります。
//! 索引はワーカーへの弱い参照だけを持つため、接続も問い合わせも無くなったルームの
//! ワーカーは終了し、次に使われたときに永続化済み状態から起動し直されます。

use std::{collections::HashMap, sync::Arc};

use tokio::{sync::Mutex, task::JoinHandle};

use crate::{
    config::RoomSettings,
    domain::{RoomKey, RoomState, StateStore, StoreError},
};

use super::{
    error::RoomStateError,
    room_coordinator::RoomCoordinator,
    room_worker::{RoomHandle, RoomWorker, WeakRoomHandle},
};

/// 起動済みワーカーの索引エントリ
struct RoomEntry {
    handle: WeakRoomHandle,
    task: JoinHandle<()>,
}

/// ルームキーから RoomWorker への索引
pub struct RoomHub {
    rooms: Mutex<HashMap<RoomKey, RoomEntry>>,
    store: Arc<dyn StateStore>,
    settings: RoomSettings,
}

impl RoomHub {
    pub fn new(store: Arc<dyn StateStore>, settings: RoomSettings) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    /// ルームの送信口を取得（未起動なら永続化済み状態を読み込んで起動）
    ///
    /// 返した送信口が生きている間、ワーカーは止まらない。
    ///
    /// # Errors
    ///
    /// 永続化済み状態の読み込みに失敗した場合は `StoreError`
    pub async fn room(&self, key: &RoomKey) -> Result<RoomHandle, StoreError> {
        let mut rooms = self.rooms.lock().await;
        Self::prune(&mut rooms);

        if let Some(entry) = rooms.remove(key) {
            if let Some(handle) = entry.handle.upgrade() {
                rooms.insert(key.clone(), entry);
                return Ok(handle);
            }
            // 終了中のワーカーが残りのコマンドを永続化し終えるまで待つ
            if let Err(e) = entry.task.await {
                tracing::error!("Room worker for '{}' failed: {}", key, e);
            }
        }

        let coordinator =
            RoomCoordinator::load(key.clone(), self.store.clone(), self.settings.clone()).await?;
        let (handle, task) = RoomWorker::spawn(coordinator);
        rooms.insert(
            key.clone(),
            RoomEntry {
                handle: handle.downgrade(),
                task,
            },
        );
        Ok(handle)
    }

    /// ルームの現在の状態（ワーカーが動いていなければ起動せずに永続化済み状態を返す）
    pub async fn state(&self, key: &RoomKey) -> Result<RoomState, RoomStateError> {
        let live = {
            let rooms = self.rooms.lock().await;
            rooms.get(key).and_then(|entry| entry.handle.upgrade())
        };
        match live {
            Some(handle) => Ok(handle.snapshot().await?),
            None => Ok(self.store.load(key).await?.unwrap_or_default()),
        }
    }

    /// 動作中のワーカー数
    pub async fn room_count(&self) -> usize {
        let mut rooms = self.rooms.lock().await;
        Self::prune(&mut rooms);
        rooms.len()
    }

    fn prune(rooms: &mut HashMap<RoomKey, RoomEntry>) {
        rooms.retain(|key, entry| {
            let running = !entry.task.is_finished();
            if !running {
                tracing::debug!("Room worker for '{}' released", key);
            }
            running
        });
    }
}
