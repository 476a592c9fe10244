//! Backend trait for per-guild point totals.
//!
//! Point totals are written by the bot's activity tracking and only read here,
//! to render `user.points*` and `user.rank*` tokens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variables::ActorStats;

/// Errors that can occur during points store operations.
#[derive(Debug, Error)]
pub enum PointsStoreError {
    /// PostgreSQL operation failed
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Backend is temporarily unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Which total a rank or points lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsField {
    Weekly,
    Monthly,
    Total,
}

impl PointsField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointsField::Weekly => "weekly",
            PointsField::Monthly => "monthly",
            PointsField::Total => "total",
        }
    }

    /// Value of this field in pre-fetched stats, if it was fetched.
    pub fn from_stats(&self, stats: &ActorStats) -> Option<i64> {
        match self {
            PointsField::Weekly => stats.weekly_points,
            PointsField::Monthly => stats.monthly_points,
            PointsField::Total => stats.total_points,
        }
    }
}

/// Point totals of one member in one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsRecord {
    pub guild_id: String,
    pub user_id: String,
    pub weekly_points: i64,
    pub monthly_points: i64,
    pub total_points: i64,
}

impl PointsRecord {
    pub fn new(guild_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            user_id: user_id.into(),
            weekly_points: 0,
            monthly_points: 0,
            total_points: 0,
        }
    }

    pub fn value(&self, field: PointsField) -> i64 {
        match field {
            PointsField::Weekly => self.weekly_points,
            PointsField::Monthly => self.monthly_points,
            PointsField::Total => self.total_points,
        }
    }
}

/// Storage for point totals.
#[async_trait]
pub trait PointsStore: Send + Sync {
    /// Backend name for logs and health output
    fn backend_name(&self) -> &'static str;

    /// Totals of `user_id` in `guild_id`, `None` when the member is untracked.
    async fn points(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<PointsRecord>, PointsStoreError>;

    /// Number of tracked members in `guild_id` whose `field` is strictly
    /// greater than `value`.
    async fn count_above(
        &self,
        guild_id: &str,
        field: PointsField,
        value: i64,
    ) -> Result<u64, PointsStoreError>;

    /// Insert or replace a member's totals.
    async fn upsert(&self, record: PointsRecord) -> Result<(), PointsStoreError>;
}
