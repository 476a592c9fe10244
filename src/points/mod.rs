//! Per-guild point totals used by the rank and points resolvers.

mod backend;
mod factory;
mod memory_backend;
mod postgres_backend;

pub use backend::{PointsField, PointsRecord, PointsStore, PointsStoreError};
pub use factory::create_points_store;
pub use memory_backend::MemoryPointsStore;
pub use postgres_backend::PostgresPointsStore;
