//! PostgreSQL-backed points store.
//!
//! Reads the `partner_points` table maintained by the bot:
//!
//! ```sql
//! CREATE TABLE partner_points (
//!     guild_id       TEXT   NOT NULL,
//!     user_id        TEXT   NOT NULL,
//!     weekly_points  BIGINT NOT NULL DEFAULT 0,
//!     monthly_points BIGINT NOT NULL DEFAULT 0,
//!     total_points   BIGINT NOT NULL DEFAULT 0,
//!     PRIMARY KEY (guild_id, user_id)
//! );
//! ```

use async_trait::async_trait;
use sqlx::PgPool;

use crate::metrics::BackendMetrics;

use super::backend::{PointsField, PointsRecord, PointsStore, PointsStoreError};

pub struct PostgresPointsStore {
    pool: PgPool,
}

impl PostgresPointsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// One statement per field so column names are never interpolated from input
fn count_above_query(field: PointsField) -> &'static str {
    match field {
        PointsField::Weekly => {
            "SELECT COUNT(*) FROM partner_points WHERE guild_id = $1 AND weekly_points > $2"
        }
        PointsField::Monthly => {
            "SELECT COUNT(*) FROM partner_points WHERE guild_id = $1 AND monthly_points > $2"
        }
        PointsField::Total => {
            "SELECT COUNT(*) FROM partner_points WHERE guild_id = $1 AND total_points > $2"
        }
    }
}

#[async_trait]
impl PointsStore for PostgresPointsStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn points(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Option<PointsRecord>, PointsStoreError> {
        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT weekly_points, monthly_points, total_points
            FROM partner_points
            WHERE guild_id = $1 AND user_id = $2
            "#,
        )
        .bind(guild_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|_| BackendMetrics::record_error("postgres", "points_get"))?;

        Ok(row.map(|(weekly, monthly, total)| PointsRecord {
            guild_id: guild_id.to_string(),
            user_id: user_id.to_string(),
            weekly_points: weekly,
            monthly_points: monthly,
            total_points: total,
        }))
    }

    async fn count_above(
        &self,
        guild_id: &str,
        field: PointsField,
        value: i64,
    ) -> Result<u64, PointsStoreError> {
        let (count,): (i64,) = sqlx::query_as(count_above_query(field))
            .bind(guild_id)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|_| BackendMetrics::record_error("postgres", "points_count_above"))?;

        Ok(count.max(0) as u64)
    }

    async fn upsert(&self, record: PointsRecord) -> Result<(), PointsStoreError> {
        sqlx::query(
            r#"
            INSERT INTO partner_points (guild_id, user_id, weekly_points, monthly_points, total_points)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (guild_id, user_id) DO UPDATE SET
                weekly_points = EXCLUDED.weekly_points,
                monthly_points = EXCLUDED.monthly_points,
                total_points = EXCLUDED.total_points
            "#,
        )
        .bind(&record.guild_id)
        .bind(&record.user_id)
        .bind(record.weekly_points)
        .bind(record.monthly_points)
        .bind(record.total_points)
        .execute(&self.pool)
        .await
        .inspect_err(|_| BackendMetrics::record_error("postgres", "points_upsert"))?;

        tracing::trace!(
            guild_id = %record.guild_id,
            user_id = %record.user_id,
            "Points record upserted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_query_targets_field_column() {
        assert!(count_above_query(PointsField::Weekly).contains("weekly_points >"));
        assert!(count_above_query(PointsField::Monthly).contains("monthly_points >"));
        assert!(count_above_query(PointsField::Total).contains("total_points >"));
    }
}
