//! Built-in resolver tables, one per context domain.

mod guild;
mod invite;
mod ranking;
mod user;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::points::PointsStore;

use super::registry::{Resolver, VariableRegistry};

pub use guild::guild_resolvers;
pub use invite::{invite_resolvers, inviter_resolvers};
pub use ranking::{compute_rank, PointsResolver, RankResolver};
pub use user::user_resolvers;

/// Token/resolver pairs handed to [`VariableRegistry::register_many`].
pub type ResolverTable = Vec<(&'static str, Arc<dyn Resolver>)>;

/// Discord timestamp markup, rendered client-side as a long date.
pub(crate) fn discord_timestamp(at: DateTime<Utc>) -> String {
    format!("<t:{}:D>", at.timestamp())
}

/// Register every built-in table on `registry`.
pub fn register_defaults(registry: &mut VariableRegistry, points: Arc<dyn PointsStore>) {
    registry.register_many(user_resolvers(points));
    registry.register_many(guild_resolvers());
    registry.register_many(invite_resolvers());
    registry.register_many(inviter_resolvers());

    tracing::debug!(tokens = registry.len(), "Registered built-in variables");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::MemoryPointsStore;

    #[test]
    fn test_defaults_have_unique_namespaced_keys() {
        let mut registry = VariableRegistry::new();
        register_defaults(&mut registry, Arc::new(MemoryPointsStore::new()));

        let keys = registry.list();
        assert!(keys.contains(&"user.rankWeekly".to_string()));
        assert!(keys.contains(&"guild.icon".to_string()));
        assert!(keys.contains(&"inviter.mention".to_string()));
        assert!(keys.iter().all(|k| k.contains('.')));

        let table_sizes = user_resolvers(Arc::new(MemoryPointsStore::new())).len()
            + guild_resolvers().len()
            + invite_resolvers().len()
            + inviter_resolvers().len();
        assert_eq!(keys.len(), table_sizes);
    }
}
