use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{
    FromRow, Pool, Sqlite, migrate,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use teloxide::types::{ChatId, UserId};
use tokio::sync::Mutex;

use crate::{
    channel::ChannelHandle,
    clock::Clock,
    storage::{GroupConfig, GroupStorage, StorageError, StorageResult},
};

#[derive(Debug, FromRow)]
struct GroupRow {
    group_id: i64,
    title: String,
    added_by_user_id: i64,
    customer_channel: Option<String>,
    is_customer_channel_required: i64,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<GroupRow> for GroupConfig {
    type Error = StorageError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let integrity = |reason: String| StorageError::DataIntegrityError(row.group_id, reason);

        let customer_channel = row
            .customer_channel
            .as_deref()
            .map(ChannelHandle::parse)
            .transpose()
            .map_err(|e| integrity(e.to_string()))?;
        let customer_channel_required = row.is_customer_channel_required != 0;
        if customer_channel_required && customer_channel.is_none() {
            return Err(integrity("required flag set without a channel".to_string()));
        }

        let created_at = DateTime::from_timestamp(row.created_at, 0)
            .ok_or_else(|| integrity(format!("bad created_at {}", row.created_at)))?;
        let updated_at = DateTime::from_timestamp(row.updated_at, 0)
            .ok_or_else(|| integrity(format!("bad updated_at {}", row.updated_at)))?;

        Ok(Self {
            group_id: ChatId(row.group_id),
            title: row.title,
            added_by: UserId(row.added_by_user_id as u64),
            customer_channel,
            customer_channel_required,
            created_at,
            updated_at,
        })
    }
}

/// SQLite-backed group configuration store. Every write runs under one
/// store-wide lock and the pool holds a single connection.
pub struct SqliteStorage {
    pool: Pool<Sqlite>,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl SqliteStorage {
    /// Opens the database, creating its directory and file if needed, and
    /// runs pending migrations.
    pub async fn new(database_url: &str, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        tracing::debug!("Connecting to SQLite database: {database_url}");
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() && !options.get_filename().ends_with(":memory:") {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // One long-lived connection, which also keeps `sqlite::memory:`
        // databases alive for the lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        migrate!("./migrations").run(&pool).await?;
        tracing::debug!("SQLite database migrated");

        Ok(Self { pool, clock, write_lock: Mutex::new(()) })
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    fn now_timestamp(&self) -> i64 {
        self.clock.now().timestamp()
    }
}

#[async_trait]
impl GroupStorage for SqliteStorage {
    async fn upsert_group(
        &self,
        group_id: ChatId,
        title: &str,
        added_by: UserId,
    ) -> StorageResult<()> {
        tracing::debug!("Upserting group {group_id} ({title})");
        let now = self.now_timestamp();
        let _guard = self.write_lock.lock().await;

        sqlx::query(
            "INSERT INTO groups (group_id, title, added_by_user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(group_id) DO UPDATE SET
                 title = excluded.title,
                 updated_at = excluded.updated_at",
        )
        .bind(group_id.0)
        .bind(title)
        .bind(added_by.0 as i64)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_customer_channel(
        &self,
        group_id: ChatId,
        channel: Option<ChannelHandle>,
    ) -> StorageResult<bool> {
        tracing::debug!("Setting customer channel for group {group_id}: {channel:?}");
        let now = self.now_timestamp();
        let required = channel.is_some();
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query(
            "UPDATE groups
             SET customer_channel = ?,
                 is_customer_channel_required = ?,
                 updated_at = ?
             WHERE group_id = ?",
        )
        .bind(channel.as_ref().map(ChannelHandle::as_str))
        .bind(required as i64)
        .bind(now)
        .bind(group_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_group(&self, group_id: ChatId) -> StorageResult<Option<GroupConfig>> {
        tracing::debug!("Getting group config: {group_id}");

        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT group_id, title, added_by_user_id, customer_channel,
                    is_customer_channel_required, created_at, updated_at
             FROM groups WHERE group_id = ?",
        )
        .bind(group_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GroupConfig::try_from).transpose()
    }

    async fn list_groups_added_by(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> StorageResult<Vec<GroupConfig>> {
        tracing::debug!("Listing groups added by user: {user_id}");

        let rows = sqlx::query_as::<_, GroupRow>(
            "SELECT group_id, title, added_by_user_id, customer_channel,
                    is_customer_channel_required, created_at, updated_at
             FROM groups
             WHERE added_by_user_id = ?
             ORDER BY updated_at DESC, group_id DESC
             LIMIT ?",
        )
        .bind(user_id.0 as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(GroupConfig::try_from).collect()
    }
}
