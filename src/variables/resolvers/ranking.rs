//! Points and leaderboard rank resolvers.
//!
//! Both degrade instead of failing: an untracked member renders `0`, and so
//! does any store error (logged here, since the substitution pass only sees
//! the `"0"`).

use std::sync::Arc;

use async_trait::async_trait;

use crate::points::{PointsField, PointsStore, PointsStoreError};
use crate::variables::context::VariableContext;
use crate::variables::registry::{Resolver, ResolverError};

/// 1-based rank of `user_id` in `guild_id` by `field`.
///
/// `known` is the member's value when already fetched. Returns 0 for an
/// untracked member; otherwise the number of members strictly above plus
/// one, so tied members share a rank.
pub async fn compute_rank(
    store: &dyn PointsStore,
    guild_id: &str,
    user_id: &str,
    field: PointsField,
    known: Option<i64>,
) -> Result<u64, PointsStoreError> {
    let value = match known {
        Some(value) => value,
        None => match store.points(guild_id, user_id).await? {
            Some(record) => record.value(field),
            None => return Ok(0),
        },
    };

    let above = store.count_above(guild_id, field, value).await?;
    Ok(above + 1)
}

/// Renders the member's total for one field.
pub struct PointsResolver {
    store: Arc<dyn PointsStore>,
    field: PointsField,
}

impl PointsResolver {
    pub fn new(store: Arc<dyn PointsStore>, field: PointsField) -> Self {
        Self { store, field }
    }

    async fn lookup(&self, ctx: &VariableContext) -> Option<Result<i64, PointsStoreError>> {
        if let Some(value) = ctx.stats.as_ref().and_then(|s| self.field.from_stats(s)) {
            return Some(Ok(value));
        }

        let user = ctx.user.as_ref()?;
        let guild = ctx.guild.as_ref()?;

        let result = self
            .store
            .points(&guild.id, &user.id)
            .await
            .map(|record| record.map(|r| r.value(self.field)).unwrap_or(0));
        Some(result)
    }
}

#[async_trait]
impl Resolver for PointsResolver {
    async fn resolve(&self, ctx: &VariableContext) -> Result<String, ResolverError> {
        match self.lookup(ctx).await {
            None => Ok(String::new()),
            Some(Ok(value)) => Ok(value.to_string()),
            Some(Err(e)) => {
                tracing::warn!(
                    field = self.field.as_str(),
                    error = %e,
                    "Points lookup failed, rendering 0"
                );
                Ok("0".to_string())
            }
        }
    }
}

/// Renders the member's leaderboard position for one field.
pub struct RankResolver {
    store: Arc<dyn PointsStore>,
    field: PointsField,
}

impl RankResolver {
    pub fn new(store: Arc<dyn PointsStore>, field: PointsField) -> Self {
        Self { store, field }
    }
}

#[async_trait]
impl Resolver for RankResolver {
    async fn resolve(&self, ctx: &VariableContext) -> Result<String, ResolverError> {
        let (Some(user), Some(guild)) = (ctx.user.as_ref(), ctx.guild.as_ref()) else {
            return Ok(String::new());
        };

        let known = ctx.stats.as_ref().and_then(|s| self.field.from_stats(s));

        match compute_rank(self.store.as_ref(), &guild.id, &user.id, self.field, known).await {
            Ok(rank) => Ok(rank.to_string()),
            Err(e) => {
                tracing::warn!(
                    field = self.field.as_str(),
                    guild_id = %guild.id,
                    user_id = %user.id,
                    error = %e,
                    "Rank lookup failed, rendering 0"
                );
                Ok("0".to_string())
            }
        }
    }
}
