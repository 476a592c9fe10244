//! In-memory points store using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{PointsField, PointsRecord, PointsStore, PointsStoreError};

/// In-memory points store keyed by guild, then user.
///
/// Data is lost on restart; intended for development and tests.
pub struct MemoryPointsStore {
    guilds: DashMap<String, DashMap<String, PointsRecord>>,
}

impl Default for MemoryPointsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPointsStore {
    pub fn new() -> Self {
        Self {
            guilds: DashMap::new(),
        }
    }

    /// Number of tracked members across all guilds
    pub fn count(&self) -> usize {
        self.guilds.iter().map(|g| g.value().len()).sum()
    }
}

#[async_trait]
impl PointsStore for MemoryPointsStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn points(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<PointsRecord>, PointsStoreError> {
        let Some(members) = self.guilds.get(guild_id) else {
            return Ok(None);
        };

        let record = members.get(user_id).map(|r| r.value().clone());
        Ok(record)
    }

    async fn count_above(
        &self,
        guild_id: &str,
        field: PointsField,
        value: i64,
    ) -> Result<u64, PointsStoreError> {
        let Some(members) = self.guilds.get(guild_id) else {
            return Ok(0);
        };

        let count = members
            .iter()
            .filter(|entry| entry.value().value(field) > value)
            .count();

        Ok(count as u64)
    }

    async fn upsert(&self, record: PointsRecord) -> Result<(), PointsStoreError> {
        self.guilds
            .entry(record.guild_id.clone())
            .or_default()
            .insert(record.user_id.clone(), record);
        Ok(())
    }
}
