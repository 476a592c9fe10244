//! PostgreSQL connection pool.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum PostgresPoolError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,

    /// Database URL (for logging purposes)
    database_url: String,
}

impl PostgresPool {
    /// Create a new PostgreSQL pool from configuration.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, PostgresPoolError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds as u64))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds as u64))
            .connect(&config.url)
            .await?;

        let created = Self {
            pool,
            database_url: config.url.clone(),
        };

        tracing::info!(
            pool_size = config.pool_size,
            url = %created.database_url_masked(),
            "PostgreSQL connection pool created"
        );

        Ok(created)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query; used by the health endpoint.
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    pub fn idle_connections(&self) -> u32 {
        self.pool.num_idle() as u32
    }

    /// Get the database URL with the password masked.
    pub fn database_url_masked(&self) -> String {
        mask_url(&self.database_url)
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL connection pool closed");
    }
}

fn mask_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            // `postgres://host@...` has no password; the colon is the scheme's
            if !url[..colon_pos].ends_with("postgres") && !url[..colon_pos].ends_with("postgresql")
            {
                let prefix = &url[..colon_pos + 1];
                let suffix = &url[at_pos..];
                return format!("{}***{}", prefix, suffix);
            }
        }
    }
    url.to_string()
}
