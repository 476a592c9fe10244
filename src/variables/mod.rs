//! Template variable resolution.
//!
//! This module provides:
//! - A registry mapping token keys (`user.name`, `guild.icon`, ...) to
//!   asynchronous resolvers
//! - A single-pass, longest-match-first substitution over template text
//! - The built-in resolver tables for users, guilds, invites and inviters
//!
//! # Example
//!
//! ```ignore
//! let mut registry = VariableRegistry::new();
//! register_defaults(&mut registry, points_store);
//! let registry = Arc::new(registry);
//!
//! let ctx = VariableContext::new()
//!     .with_user(Actor::new("42", "ada"))
//!     .with_guild(GuildInfo::new("9", "TestGuild"));
//!
//! let text = registry.replace("Welcome user.mention to guild.name!", &ctx).await;
//! assert_eq!(text, "Welcome <@42> to TestGuild!");
//! ```
//!
//! Tokens are matched literally and case-sensitively anywhere in the text;
//! there is no escape syntax and no word-boundary check.

mod context;
mod observer;
mod registry;
pub mod resolvers;

pub use context::{Actor, ActorStats, GuildInfo, InviteInfo, VariableContext};
pub use observer::{ResolutionObserver, TracingObserver};
pub use registry::{field, FieldResolver, Resolver, ResolverError, VariableRegistry};
pub use resolvers::register_defaults;
