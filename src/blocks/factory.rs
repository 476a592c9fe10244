//! Block repository factory

use std::sync::Arc;

use crate::config::BlocksConfig;
use crate::postgres::PostgresPool;

use super::backend::BlockRepository;
use super::memory_backend::MemoryBlockRepository;
use super::postgres_backend::PostgresBlockRepository;

/// Create a block repository based on configuration.
///
/// - `"postgres"`: `PostgresBlockRepository` if a pool is provided
/// - `"memory"` (default): `MemoryBlockRepository`
pub fn create_block_repository(
    settings: &BlocksConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Arc<dyn BlockRepository> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL block repository");
                Arc::new(PostgresBlockRepository::new(pool.pool().clone()))
            } else {
                tracing::warn!(
                    "PostgreSQL block repository requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryBlockRepository::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory block repository");
            Arc::new(MemoryBlockRepository::new())
        }
    }
}
