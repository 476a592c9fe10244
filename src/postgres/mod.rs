//! PostgreSQL persistence module.
//!
//! Provides the shared connection pool used by the points store and the
//! block repository.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
