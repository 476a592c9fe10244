//! `invite.*` and `inviter.*` tokens, used by welcome messages.

use crate::variables::context::{Actor, InviteInfo, VariableContext};
use crate::variables::registry::field;

use super::{discord_timestamp, ResolverTable};

fn with_invite(ctx: &VariableContext, read: impl Fn(&InviteInfo) -> String) -> String {
    ctx.invite.as_ref().map(read).unwrap_or_default()
}

fn with_inviter(ctx: &VariableContext, read: impl Fn(&Actor) -> String) -> String {
    ctx.inviter().map(read).unwrap_or_default()
}

pub fn invite_resolvers() -> ResolverTable {
    vec![
        ("invite.code", field(|ctx| with_invite(ctx, |i| i.code.clone()))),
        ("invite.url", field(|ctx| with_invite(ctx, InviteInfo::resolved_url))),
        (
            "invite.uses",
            field(|ctx| with_invite(ctx, |i| i.uses.map(|u| u.to_string()).unwrap_or_default())),
        ),
        (
            "invite.maxUses",
            field(|ctx| {
                with_invite(ctx, |i| match i.max_uses {
                    Some(0) => "∞".to_string(),
                    Some(max) => max.to_string(),
                    None => String::new(),
                })
            }),
        ),
        (
            "invite.channel",
            field(|ctx| with_invite(ctx, |i| i.channel_name.clone().unwrap_or_default())),
        ),
        (
            "invite.expires",
            field(|ctx| with_invite(ctx, |i| i.expires_at.map(discord_timestamp).unwrap_or_default())),
        ),
    ]
}

pub fn inviter_resolvers() -> ResolverTable {
    vec![
        ("inviter.id", field(|ctx| with_inviter(ctx, |a| a.id.clone()))),
        (
            "inviter.name",
            field(|ctx| with_inviter(ctx, |a| a.display_name().to_string())),
        ),
        ("inviter.username", field(|ctx| with_inviter(ctx, |a| a.username.clone()))),
        ("inviter.mention", field(|ctx| with_inviter(ctx, Actor::mention))),
        (
            "inviter.avatar",
            field(|ctx| with_inviter(ctx, |a| a.avatar_url.clone().unwrap_or_default())),
        ),
    ]
}
