//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use super::{
    BACKEND_ERRORS_TOTAL, BACKEND_OPERATION_LATENCY, DISPLAY_OMITTED_TOTAL,
    DISPLAY_RENDERS_TOTAL, DISPLAY_RENDER_COMPONENTS, DISPLAY_RENDER_LATENCY,
    EDITOR_EDITS_TOTAL, EDITOR_SESSIONS_ACTIVE, EDITOR_SESSIONS_TOTAL, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_LATENCY, REAPER_DURATION_MS, VARIABLE_RESOLVER_FAILURES_TOTAL,
    VARIABLE_SUBSTITUTIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording variable substitution metrics
pub struct VariableMetrics;

impl VariableMetrics {
    /// Record token occurrences handed to resolvers in one replace call
    pub fn record_substitutions(count: u64) {
        VARIABLE_SUBSTITUTIONS_TOTAL.inc_by(count);
    }

    /// Record a resolver that errored or panicked
    pub fn record_resolver_failure(token: &str) {
        VARIABLE_RESOLVER_FAILURES_TOTAL
            .with_label_values(&[token])
            .inc();
    }
}

/// Helper struct for recording render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    pub fn record_render(latency_secs: f64, components: usize, omitted: usize) {
        DISPLAY_RENDERS_TOTAL.inc();
        DISPLAY_RENDER_LATENCY.observe(latency_secs);
        DISPLAY_RENDER_COMPONENTS.observe(components as f64);
        DISPLAY_OMITTED_TOTAL.inc_by(omitted as u64);
    }
}

/// Helper struct for editor session metrics
pub struct EditorMetrics;

impl EditorMetrics {
    pub fn set_active(count: usize) {
        EDITOR_SESSIONS_ACTIVE.set(count as i64);
    }

    pub fn record_opened() {
        EDITOR_SESSIONS_TOTAL.with_label_values(&["opened"]).inc();
    }

    pub fn record_saved() {
        EDITOR_SESSIONS_TOTAL.with_label_values(&["saved"]).inc();
    }

    pub fn record_cancelled() {
        EDITOR_SESSIONS_TOTAL.with_label_values(&["cancelled"]).inc();
    }

    pub fn record_expired(count: u64) {
        EDITOR_SESSIONS_TOTAL
            .with_label_values(&["expired"])
            .inc_by(count);
    }

    /// Save failed in storage; the session stays open
    pub fn record_save_failed() {
        EDITOR_SESSIONS_TOTAL
            .with_label_values(&["save_failed"])
            .inc();
    }

    pub fn record_edit_applied() {
        EDITOR_EDITS_TOTAL.with_label_values(&["applied"]).inc();
    }

    pub fn record_edit_rejected() {
        EDITOR_EDITS_TOTAL.with_label_values(&["rejected"]).inc();
    }
}

/// Helper struct for session reaper metrics
pub struct ReaperMetrics;

impl ReaperMetrics {
    /// Record sweep duration
    pub fn record_duration_ms(duration_ms: f64) {
        REAPER_DURATION_MS.observe(duration_ms);
    }
}

/// Helper struct for HTTP request metrics
pub struct HttpMetrics;

impl HttpMetrics {
    pub fn record_request(method: &str, path: &str, status: u16, latency_secs: f64) {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&[method, path, &status.to_string()])
            .inc();
        HTTP_REQUEST_LATENCY
            .with_label_values(&[method, path])
            .observe(latency_secs);
    }
}

/// Helper struct for backend metrics
pub struct BackendMetrics;

impl BackendMetrics {
    /// Record backend operation latency
    pub fn record_latency(backend: &str, operation: &str, latency_secs: f64) {
        BACKEND_OPERATION_LATENCY
            .with_label_values(&[backend, operation])
            .observe(latency_secs);
    }

    /// Record backend error
    pub fn record_error(backend: &str, operation: &str) {
        BACKEND_ERRORS_TOTAL
            .with_label_values(&[backend, operation])
            .inc();
    }
}
