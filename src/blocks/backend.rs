//! Storage abstraction for saved display blocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::display::DisplayBlock;

#[derive(Debug, Error)]
pub enum BlockStoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// A named block persisted for a guild.
///
/// `(guild_id, name)` is unique; saving under an existing name replaces the
/// block but keeps `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBlock {
    pub id: Uuid,
    pub guild_id: String,
    pub name: String,
    pub block: DisplayBlock,
    /// Operator who last saved the block
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait BlockRepository: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Insert or replace the block stored under `name`.
    async fn save(
        &self,
        guild_id: &str,
        name: &str,
        block: &DisplayBlock,
        operator_id: &str,
    ) -> Result<SavedBlock, BlockStoreError>;

    async fn get(&self, guild_id: &str, name: &str) -> Result<Option<SavedBlock>, BlockStoreError>;

    /// All blocks of a guild, ordered by name.
    async fn list(&self, guild_id: &str) -> Result<Vec<SavedBlock>, BlockStoreError>;

    /// Returns whether a block was removed.
    async fn delete(&self, guild_id: &str, name: &str) -> Result<bool, BlockStoreError>;
}
