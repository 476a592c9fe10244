//! Variable registry and the substitution pass.

use std::collections::HashMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::join_all;
use futures::FutureExt;
use regex::Regex;
use smallvec::SmallVec;
use thiserror::Error;

use super::context::VariableContext;
use super::observer::{ResolutionObserver, TracingObserver};

/// Errors a resolver may report. The substitution pass turns every one of
/// them into an empty string.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Resolver panicked")]
    Panicked,

    #[error("{0}")]
    Other(String),
}

/// Produces the runtime value of one token.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: &VariableContext) -> Result<String, ResolverError>;
}

/// Resolver over a plain field read of the context.
pub struct FieldResolver<F> {
    read: F,
}

impl<F> FieldResolver<F>
where
    F: Fn(&VariableContext) -> String + Send + Sync + 'static,
{
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

#[async_trait]
impl<F> Resolver for FieldResolver<F>
where
    F: Fn(&VariableContext) -> String + Send + Sync + 'static,
{
    async fn resolve(&self, ctx: &VariableContext) -> Result<String, ResolverError> {
        Ok((self.read)(ctx))
    }
}

/// Shorthand for an `Arc`-wrapped [`FieldResolver`].
pub fn field<F>(read: F) -> Arc<dyn Resolver>
where
    F: Fn(&VariableContext) -> String + Send + Sync + 'static,
{
    Arc::new(FieldResolver::new(read))
}

enum Segment<'a> {
    Literal(&'a str),
    Pending(usize),
}

/// Maps token keys to resolvers.
///
/// Built once by the startup sequence (`register*` take `&mut self`) and then
/// shared read-only behind an `Arc`, so every `replace` call sees a fixed key
/// set without locking.
pub struct VariableRegistry {
    resolvers: HashMap<String, Arc<dyn Resolver>>,
    /// Keys in first-insertion order
    order: Vec<String>,
    /// Alternation over all keys, rebuilt lazily after each registration
    pattern: OnceLock<Option<Regex>>,
    observer: Arc<dyn ResolutionObserver>,
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableRegistry")
            .field("keys", &self.order)
            .finish()
    }
}

impl VariableRegistry {
    /// Create an empty registry reporting failures through `tracing`.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Create an empty registry with a custom failure observer.
    pub fn with_observer(observer: Arc<dyn ResolutionObserver>) -> Self {
        Self {
            resolvers: HashMap::new(),
            order: Vec::new(),
            pattern: OnceLock::new(),
            observer,
        }
    }

    /// Insert or overwrite the resolver for `name`. Last writer wins.
    pub fn register(&mut self, name: impl Into<String>, resolver: Arc<dyn Resolver>) {
        let name = name.into();
        if name.is_empty() {
            tracing::warn!("Ignoring resolver registered under an empty token");
            return;
        }

        if self.resolvers.insert(name.clone(), resolver).is_some() {
            tracing::debug!(token = %name, "Resolver overwritten");
        } else {
            self.order.push(name);
        }

        self.pattern = OnceLock::new();
    }

    /// Register every entry of `table` in iteration order.
    pub fn register_many<I, K>(&mut self, table: I)
    where
        I: IntoIterator<Item = (K, Arc<dyn Resolver>)>,
        K: Into<String>,
    {
        for (name, resolver) in table {
            self.register(name, resolver);
        }
    }

    /// Resolver for `name`, without invoking it.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Resolver>> {
        self.resolvers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    /// All registered keys in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Like [`replace`](Self::replace), treating a missing text as empty.
    pub async fn replace_opt(&self, text: Option<&str>, ctx: &VariableContext) -> String {
        match text {
            Some(text) => self.replace(text, ctx).await,
            None => String::new(),
        }
    }

    /// Substitute every registered token in `text`.
    ///
    /// Keys are tried longest first at each position. Literal text is kept
    /// byte for byte; resolvers for all matches run concurrently and a failing
    /// resolver contributes an empty string.
    pub async fn replace(&self, text: &str, ctx: &VariableContext) -> String {
        if text.is_empty() {
            return String::new();
        }

        let Some(pattern) = self.pattern() else {
            return text.to_string();
        };

        let mut segments: SmallVec<[Segment<'_>; 8]> = SmallVec::new();
        let mut pending = Vec::new();
        let mut last_end = 0;

        for m in pattern.find_iter(text) {
            if m.start() > last_end {
                segments.push(Segment::Literal(&text[last_end..m.start()]));
            }

            let token = m.as_str();
            match self.resolvers.get(token) {
                Some(resolver) => {
                    segments.push(Segment::Pending(pending.len()));
                    pending.push(self.invoke(token, resolver.as_ref(), ctx));
                }
                // Pattern and map come from the same key set; keep the text if they ever disagree
                None => segments.push(Segment::Literal(token)),
            }

            last_end = m.end();
        }

        if last_end < text.len() {
            segments.push(Segment::Literal(&text[last_end..]));
        }

        if pending.is_empty() {
            return text.to_string();
        }

        self.observer.substituted(pending.len());
        let resolved = join_all(pending).await;

        let mut output = String::with_capacity(text.len());
        for segment in segments {
            match segment {
                Segment::Literal(s) => output.push_str(s),
                Segment::Pending(index) => output.push_str(&resolved[index]),
            }
        }

        output
    }

    async fn invoke(&self, token: &str, resolver: &dyn Resolver, ctx: &VariableContext) -> String {
        match AssertUnwindSafe(resolver.resolve(ctx)).catch_unwind().await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                self.observer.resolver_failed(token, &e);
                String::new()
            }
            Err(_) => {
                self.observer.resolver_failed(token, &ResolverError::Panicked);
                String::new()
            }
        }
    }

    fn pattern(&self) -> Option<&Regex> {
        self.pattern.get_or_init(|| self.build_pattern()).as_ref()
    }

    fn build_pattern(&self) -> Option<Regex> {
        if self.order.is_empty() {
            return None;
        }

        let mut keys: Vec<&str> = self.order.iter().map(String::as_str).collect();
        // Stable: equal-length keys keep insertion order
        keys.sort_by(|a, b| b.len().cmp(&a.len()));

        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        match Regex::new(&alternation) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    keys = keys.len(),
                    "Failed to compile variable pattern, substitution disabled"
                );
                None
            }
        }
    }
}
