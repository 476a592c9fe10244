//! Points store factory

use std::sync::Arc;

use crate::config::PointsConfig;
use crate::postgres::PostgresPool;

use super::backend::PointsStore;
use super::memory_backend::MemoryPointsStore;
use super::postgres_backend::PostgresPointsStore;

/// Create a points store based on configuration.
///
/// - `"postgres"`: `PostgresPointsStore` if a pool is provided
/// - `"memory"` (default): `MemoryPointsStore`
pub fn create_points_store(
    settings: &PointsConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> Arc<dyn PointsStore> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL points store");
                Arc::new(PostgresPointsStore::new(pool.pool().clone()))
            } else {
                tracing::warn!(
                    "PostgreSQL points store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryPointsStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory points store");
            Arc::new(MemoryPointsStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_without_pool_falls_back() {
        let config = PointsConfig {
            backend: "postgres".to_string(),
        };
        let store = create_points_store(&config, None);
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn test_default_backend_is_memory() {
        let store = create_points_store(&PointsConfig::default(), None);
        assert_eq!(store.backend_name(), "memory");
    }
}
