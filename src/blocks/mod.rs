//! Saved display blocks, addressed by guild and name.

mod backend;
mod factory;
mod memory_backend;
mod postgres_backend;

pub use backend::{BlockRepository, BlockStoreError, SavedBlock};
pub use factory::create_block_repository;
pub use memory_backend::MemoryBlockRepository;
pub use postgres_backend::PostgresBlockRepository;
