//! `user.*` tokens: the member the text is rendered for.

use std::sync::Arc;

use crate::points::{PointsField, PointsStore};
use crate::variables::context::{Actor, VariableContext};
use crate::variables::registry::{field, Resolver};

use super::ranking::{PointsResolver, RankResolver};
use super::{discord_timestamp, ResolverTable};

fn with_user(ctx: &VariableContext, read: impl Fn(&Actor) -> String) -> String {
    ctx.user.as_ref().map(read).unwrap_or_default()
}

pub fn user_resolvers(points: Arc<dyn PointsStore>) -> ResolverTable {
    let points_resolver = |f: PointsField| -> Arc<dyn Resolver> {
        Arc::new(PointsResolver::new(points.clone(), f))
    };
    let rank_resolver = |f: PointsField| -> Arc<dyn Resolver> {
        Arc::new(RankResolver::new(points.clone(), f))
    };

    vec![
        ("user.id", field(|ctx| with_user(ctx, |u| u.id.clone()))),
        ("user.name", field(|ctx| with_user(ctx, |u| u.display_name().to_string()))),
        ("user.username", field(|ctx| with_user(ctx, |u| u.username.clone()))),
        ("user.tag", field(|ctx| with_user(ctx, Actor::tag))),
        ("user.mention", field(|ctx| with_user(ctx, Actor::mention))),
        (
            "user.avatar",
            field(|ctx| with_user(ctx, |u| u.avatar_url.clone().unwrap_or_default())),
        ),
        (
            "user.nickname",
            field(|ctx| with_user(ctx, |u| u.nickname.clone().unwrap_or_default())),
        ),
        ("user.bot", field(|ctx| with_user(ctx, |u| u.bot.to_string()))),
        (
            "user.created",
            field(|ctx| with_user(ctx, |u| u.created_at.map(discord_timestamp).unwrap_or_default())),
        ),
        (
            "user.joined",
            field(|ctx| with_user(ctx, |u| u.joined_at.map(discord_timestamp).unwrap_or_default())),
        ),
        ("user.pointsWeekly", points_resolver(PointsField::Weekly)),
        ("user.pointsMonthly", points_resolver(PointsField::Monthly)),
        ("user.pointsAll", points_resolver(PointsField::Total)),
        ("user.rankWeekly", rank_resolver(PointsField::Weekly)),
        ("user.rankMonthly", rank_resolver(PointsField::Monthly)),
        ("user.rankAll", rank_resolver(PointsField::Total)),
    ]
}
