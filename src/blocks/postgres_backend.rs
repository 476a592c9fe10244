//! PostgreSQL-backed block repository.
//!
//! Blocks are stored as JSONB:
//!
//! ```sql
//! CREATE TABLE display_blocks (
//!     id         UUID        NOT NULL,
//!     guild_id   TEXT        NOT NULL,
//!     name       TEXT        NOT NULL,
//!     block      JSONB       NOT NULL,
//!     created_by TEXT        NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (guild_id, name)
//! );
//! ```

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::display::DisplayBlock;
use crate::metrics::BackendMetrics;

use super::backend::{BlockRepository, BlockStoreError, SavedBlock};

type BlockRow = (
    Uuid,
    String,
    String,
    Json<DisplayBlock>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn from_row(row: BlockRow) -> SavedBlock {
    let (id, guild_id, name, Json(block), created_by, created_at, updated_at) = row;
    SavedBlock {
        id,
        guild_id,
        name,
        block,
        created_by,
        created_at,
        updated_at,
    }
}

pub struct PostgresBlockRepository {
    pool: PgPool,
}

impl PostgresBlockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockRepository for PostgresBlockRepository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn save(
        &self,
        guild_id: &str,
        name: &str,
        block: &DisplayBlock,
        operator_id: &str,
    ) -> Result<SavedBlock, BlockStoreError> {
        let start = Instant::now();

        let row: BlockRow = sqlx::query_as(
            r#"
            INSERT INTO display_blocks (id, guild_id, name, block, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (guild_id, name) DO UPDATE SET
                block = EXCLUDED.block,
                created_by = EXCLUDED.created_by,
                updated_at = NOW()
            RETURNING id, guild_id, name, block, created_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(guild_id)
        .bind(name)
        .bind(Json(block))
        .bind(operator_id)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|_| BackendMetrics::record_error("postgres", "blocks_save"))?;

        BackendMetrics::record_latency("postgres", "blocks_save", start.elapsed().as_secs_f64());

        tracing::debug!(guild_id = %guild_id, name = %name, "Block saved to PostgreSQL");

        Ok(from_row(row))
    }

    async fn get(&self, guild_id: &str, name: &str) -> Result<Option<SavedBlock>, BlockStoreError> {
        let start = Instant::now();

        let row: Option<BlockRow> = sqlx::query_as(
            r#"
            SELECT id, guild_id, name, block, created_by, created_at, updated_at
            FROM display_blocks
            WHERE guild_id = $1 AND name = $2
            "#,
        )
        .bind(guild_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|_| BackendMetrics::record_error("postgres", "blocks_get"))?;

        BackendMetrics::record_latency("postgres", "blocks_get", start.elapsed().as_secs_f64());

        Ok(row.map(from_row))
    }

    async fn list(&self, guild_id: &str) -> Result<Vec<SavedBlock>, BlockStoreError> {
        let rows: Vec<BlockRow> = sqlx::query_as(
            r#"
            SELECT id, guild_id, name, block, created_by, created_at, updated_at
            FROM display_blocks
            WHERE guild_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|_| BackendMetrics::record_error("postgres", "blocks_list"))?;

        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn delete(&self, guild_id: &str, name: &str) -> Result<bool, BlockStoreError> {
        let result = sqlx::query("DELETE FROM display_blocks WHERE guild_id = $1 AND name = $2")
            .bind(guild_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .inspect_err(|_| BackendMetrics::record_error("postgres", "blocks_delete"))?;

        Ok(result.rows_affected() > 0)
    }
}
