//! Render context handed to resolvers.
//!
//! A `VariableContext` is built fresh for every render and never shared
//! between renders. Every field is optional; resolvers degrade to an empty
//! string when the part of the context they read is absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Discord user (or guild member) the text is rendered for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    /// Snowflake ID
    pub id: String,

    /// Account username
    pub username: String,

    /// Display name chosen by the user (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,

    /// Legacy discriminator, `"0"` for migrated accounts (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,

    /// Avatar URL (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Guild nickname when rendered inside a guild (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Whether the account is a bot
    #[serde(default)]
    pub bot: bool,

    /// Account creation time (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Time the member joined the guild (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
}

impl Actor {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// Name shown to other users: nickname, then global name, then username.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.global_name.as_deref())
            .unwrap_or(&self.username)
    }

    /// `username#1234` for legacy accounts, plain username otherwise.
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if !d.is_empty() && d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// The guild a render happens in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildInfo {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost_count: Option<u64>,

    /// Premium tier, 0-3
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost_tier: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GuildInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Pre-fetched point totals for the rendered user.
///
/// A `None` field means the value was not fetched; resolvers then look it up
/// in the points store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ActorStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_points: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_points: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<i64>,
}

/// An invite used by a joining member.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteInfo {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<u64>,

    /// 0 means unlimited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// The member who created the invite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter: Option<Actor>,
}

impl InviteInfo {
    /// Invite URL, derived from the code when not given explicitly.
    pub fn resolved_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None if self.code.is_empty() => String::new(),
            None => format!("https://discord.gg/{}", self.code),
        }
    }
}

/// Everything a resolver may read during one render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Actor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild: Option<GuildInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ActorStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invite: Option<InviteInfo>,
}

impl VariableContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: Actor) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_guild(mut self, guild: GuildInfo) -> Self {
        self.guild = Some(guild);
        self
    }

    pub fn with_stats(mut self, stats: ActorStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_invite(mut self, invite: InviteInfo) -> Self {
        self.invite = Some(invite);
        self
    }

    /// The inviter nested in the invite, if any.
    pub fn inviter(&self) -> Option<&Actor> {
        self.invite.as_ref().and_then(|i| i.inviter.as_ref())
    }
}
