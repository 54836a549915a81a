//! Persistence boundary of the domain.

use async_trait::async_trait;

use super::{entity::RoomState, error::StoreError, value_object::RoomKey};

/// Load/save of one named snapshot blob per room.
///
/// Implementations are last-write-wins: running two coordinators against
/// the same key can silently lose updates, so each room must have a single
/// writer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the snapshot of `key`, `None` when nothing was saved yet.
    async fn load(&self, key: &RoomKey) -> Result<Option<RoomState>, StoreError>;

    /// Replace the snapshot of `key`.
    async fn save(&self, key: &RoomKey, state: &RoomState) -> Result<(), StoreError>;
}
