//! Observability hook for the substitution pass.

use crate::metrics::VariableMetrics;

use super::registry::ResolverError;

/// Receives resolver outcomes from [`VariableRegistry::replace`].
///
/// Failures never change the rendered text (the token becomes an empty
/// string); the observer is where they surface to operators.
///
/// [`VariableRegistry::replace`]: super::VariableRegistry::replace
pub trait ResolutionObserver: Send + Sync {
    /// A resolver returned an error or panicked.
    fn resolver_failed(&self, token: &str, error: &ResolverError);

    /// A replace call is about to resolve `count` token occurrences.
    fn substituted(&self, _count: usize) {}
}

/// Default observer: structured log line plus Prometheus counters.
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn resolver_failed(&self, token: &str, error: &ResolverError) {
        tracing::warn!(
            token = %token,
            error = %error,
            "Variable resolver failed, substituting empty string"
        );
        VariableMetrics::record_resolver_failure(token);
    }

    fn substituted(&self, count: usize) {
        VariableMetrics::record_substitutions(count as u64);
    }
}
