mod group_entity;
/// SQLite implementation of `GroupStorage`.
pub mod sqlite;

use async_trait::async_trait;
pub use group_entity::GroupConfig;
use mockall::automock;
use teloxide::types::{ChatId, UserId};
use thiserror::Error;

use crate::channel::ChannelHandle;

/// Errors from the configuration store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A query failed.
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
    /// The schema could not be brought up to date.
    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    /// The database directory could not be created.
    #[error("Failed to prepare database location: {0}")]
    IoError(#[from] std::io::Error),
    /// A stored row does not decode into a valid `GroupConfig`.
    #[error("Data integrity error: Stored group '{0}' is invalid: {1}")]
    DataIntegrityError(i64, String),
}

/// Result type of storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence of per-group configuration.
#[automock]
#[async_trait]
pub trait GroupStorage: Send + Sync {
    /// Registers a group, or refreshes its title and activity time if it is
    /// already known. The original registrant is kept.
    async fn upsert_group(&self, group_id: ChatId, title: &str, added_by: UserId)
    -> StorageResult<()>;

    /// Sets or clears the secondary channel requirement. Returns false if the
    /// group is not registered.
    async fn set_customer_channel(
        &self,
        group_id: ChatId,
        channel: Option<ChannelHandle>,
    ) -> StorageResult<bool>;

    /// Get the configuration of a group.
    async fn get_group(&self, group_id: ChatId) -> StorageResult<Option<GroupConfig>>;

    /// Get groups registered by a user, most recently active first.
    async fn list_groups_added_by(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> StorageResult<Vec<GroupConfig>>;
}
