//! In-memory block repository using DashMap.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::display::DisplayBlock;

use super::backend::{BlockRepository, BlockStoreError, SavedBlock};

/// Blocks keyed by `(guild_id, name)`. Data is lost on restart.
pub struct MemoryBlockRepository {
    blocks: DashMap<(String, String), SavedBlock>,
}

impl Default for MemoryBlockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlockRepository {
    pub fn new() -> Self {
        Self {
            blocks: DashMap::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.blocks.len()
    }
}

#[async_trait]
impl BlockRepository for MemoryBlockRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn save(
        &self,
        guild_id: &str,
        name: &str,
        block: &DisplayBlock,
        operator_id: &str,
    ) -> Result<SavedBlock, BlockStoreError> {
        let now = Utc::now();
        let mut entry = self
            .blocks
            .entry((guild_id.to_string(), name.to_string()))
            .or_insert_with(|| SavedBlock {
                id: Uuid::new_v4(),
                guild_id: guild_id.to_string(),
                name: name.to_string(),
                block: DisplayBlock::default(),
                created_by: operator_id.to_string(),
                created_at: now,
                updated_at: now,
            });

        entry.block = block.clone();
        entry.created_by = operator_id.to_string();
        entry.updated_at = now;

        Ok(entry.clone())
    }

    async fn get(&self, guild_id: &str, name: &str) -> Result<Option<SavedBlock>, BlockStoreError> {
        let key = (guild_id.to_string(), name.to_string());
        Ok(self.blocks.get(&key).map(|b| b.value().clone()))
    }

    async fn list(&self, guild_id: &str) -> Result<Vec<SavedBlock>, BlockStoreError> {
        let mut blocks: Vec<SavedBlock> = self
            .blocks
            .iter()
            .filter(|entry| entry.key().0 == guild_id)
            .map(|entry| entry.value().clone())
            .collect();
        blocks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blocks)
    }

    async fn delete(&self, guild_id: &str, name: &str) -> Result<bool, BlockStoreError> {
        let key = (guild_id.to_string(), name.to_string());
        Ok(self.blocks.remove(&key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BlockComponent;

    fn block(text: &str) -> DisplayBlock {
        DisplayBlock {
            components: vec![BlockComponent::Text {
                content: text.to_string(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = MemoryBlockRepository::new();
        let saved = repo.save("9", "welcome", &block("hi"), "op").await.unwrap();

        let loaded = repo.get("9", "welcome").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert!(repo.get("10", "welcome").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resave_keeps_identity() {
        let repo = MemoryBlockRepository::new();
        let first = repo.save("9", "welcome", &block("v1"), "op-a").await.unwrap();
        let second = repo.save("9", "welcome", &block("v2"), "op-b").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(second.block, block("v2"));
        assert_eq!(second.created_by, "op-b");
        assert_eq!(repo.count(), 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_sorted() {
        let repo = MemoryBlockRepository::new();
        repo.save("9", "rules", &block("r"), "op").await.unwrap();
        repo.save("9", "about", &block("a"), "op").await.unwrap();
        repo.save("10", "other", &block("o"), "op").await.unwrap();

        let names: Vec<String> = repo
            .list("9")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["about", "rules"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = MemoryBlockRepository::new();
        repo.save("9", "rules", &block("r"), "op").await.unwrap();

        assert!(repo.delete("9", "rules").await.unwrap());
        assert!(!repo.delete("9", "rules").await.unwrap());
    }
}
