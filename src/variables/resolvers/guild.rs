//! `guild.*` tokens

use crate::variables::context::{GuildInfo, VariableContext};
use crate::variables::registry::field;

use super::{discord_timestamp, ResolverTable};

fn with_guild(ctx: &VariableContext, read: impl Fn(&GuildInfo) -> String) -> String {
    ctx.guild.as_ref().map(read).unwrap_or_default()
}

fn optional_count(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn guild_resolvers() -> ResolverTable {
    vec![
        ("guild.id", field(|ctx| with_guild(ctx, |g| g.id.clone()))),
        ("guild.name", field(|ctx| with_guild(ctx, |g| g.name.clone()))),
        (
            "guild.icon",
            field(|ctx| with_guild(ctx, |g| g.icon_url.clone().unwrap_or_default())),
        ),
        (
            "guild.banner",
            field(|ctx| with_guild(ctx, |g| g.banner_url.clone().unwrap_or_default())),
        ),
        (
            "guild.members",
            field(|ctx| with_guild(ctx, |g| optional_count(g.member_count))),
        ),
        (
            "guild.boosts",
            field(|ctx| with_guild(ctx, |g| optional_count(g.boost_count))),
        ),
        (
            "guild.boostLevel",
            field(|ctx| with_guild(ctx, |g| g.boost_tier.map(|t| t.to_string()).unwrap_or_default())),
        ),
        (
            "guild.owner",
            field(|ctx| {
                with_guild(ctx, |g| {
                    g.owner_id
                        .as_ref()
                        .map(|id| format!("<@{}>", id))
                        .unwrap_or_default()
                })
            }),
        ),
        (
            "guild.created",
            field(|ctx| with_guild(ctx, |g| g.created_at.map(discord_timestamp).unwrap_or_default())),
        ),
    ]
}
