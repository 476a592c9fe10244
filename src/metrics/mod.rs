//! Prometheus metrics for the display service.
//!
//! This module provides metrics for monitoring the service:
//! - Variable substitution metrics (token occurrences, resolver failures)
//! - Render metrics (renders, latency, omitted elements)
//! - Editor session metrics (active sessions, lifecycle outcomes, edits)
//! - Backend metrics (points and block storage)
//! - HTTP API metrics

mod helpers;

pub use helpers::{
    encode_metrics, BackendMetrics, EditorMetrics, HttpMetrics, ReaperMetrics, RenderMetrics,
    VariableMetrics,
};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "amayo";

lazy_static! {
    // ============================================================================
    // Variable Metrics
    // ============================================================================

    /// Token occurrences handed to resolvers
    pub static ref VARIABLE_SUBSTITUTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_variable_substitutions_total", METRIC_PREFIX),
        "Total token occurrences resolved during substitution"
    ).unwrap();

    /// Resolver failures by token
    pub static ref VARIABLE_RESOLVER_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_variable_resolver_failures_total", METRIC_PREFIX),
        "Total resolver failures (errors and panics) by token",
        &["token"]
    ).unwrap();

    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Blocks rendered
    pub static ref DISPLAY_RENDERS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_display_renders_total", METRIC_PREFIX),
        "Total display blocks rendered"
    ).unwrap();

    /// Render latency, including resolver lookups
    pub static ref DISPLAY_RENDER_LATENCY: Histogram = register_histogram!(
        format!("{}_display_render_latency_seconds", METRIC_PREFIX),
        "Display render latency in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    ).unwrap();

    /// Components per rendered container
    pub static ref DISPLAY_RENDER_COMPONENTS: Histogram = register_histogram!(
        format!("{}_display_render_components", METRIC_PREFIX),
        "Number of components in a rendered container",
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 40.0]
    ).unwrap();

    /// Elements dropped by the URL gate or for empty text
    pub static ref DISPLAY_OMITTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_display_omitted_elements_total", METRIC_PREFIX),
        "Total elements omitted from rendered payloads"
    ).unwrap();

    // ============================================================================
    // Editor Metrics
    // ============================================================================

    /// Open editor sessions
    pub static ref EDITOR_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_editor_sessions_active", METRIC_PREFIX),
        "Number of open editor sessions"
    ).unwrap();

    /// Session lifecycle events by outcome
    pub static ref EDITOR_SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_editor_sessions_total", METRIC_PREFIX),
        "Editor session lifecycle events",
        &["outcome"]
    ).unwrap();

    /// Edit operations by result
    pub static ref EDITOR_EDITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_editor_edits_total", METRIC_PREFIX),
        "Editor operations applied or rejected",
        &["result"]
    ).unwrap();

    /// Session reaper sweep duration in milliseconds
    pub static ref REAPER_DURATION_MS: Histogram = register_histogram!(
        format!("{}_reaper_duration_ms", METRIC_PREFIX),
        "Session reaper sweep duration in milliseconds",
        vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0]
    ).unwrap();

    // ============================================================================
    // HTTP API Metrics
    // ============================================================================

    /// HTTP request counter by method and path
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_http_requests_total", METRIC_PREFIX),
        "Total HTTP requests",
        &["method", "path", "status"]
    ).unwrap();

    /// HTTP request latency
    pub static ref HTTP_REQUEST_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_http_request_latency_seconds", METRIC_PREFIX),
        "HTTP request latency in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    ).unwrap();

    // ============================================================================
    // Backend Metrics
    // ============================================================================

    /// Backend operation latency
    pub static ref BACKEND_OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_backend_operation_latency_seconds", METRIC_PREFIX),
        "Backend operation latency in seconds",
        &["backend", "operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    ).unwrap();

    /// Backend operation errors
    pub static ref BACKEND_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_backend_errors_total", METRIC_PREFIX),
        "Total backend operation errors",
        &["backend", "operation"]
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics() {
        // lazy_static requires first access
        DISPLAY_RENDERS_TOTAL.inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("amayo_display_renders_total"));
    }

    #[test]
    fn test_editor_metrics() {
        EDITOR_SESSIONS_ACTIVE.set(3);
        EDITOR_SESSIONS_TOTAL.with_label_values(&["opened"]).inc();
        EDITOR_EDITS_TOTAL.with_label_values(&["applied"]).inc();
        REAPER_DURATION_MS.observe(1.0);
        // Just verify no panics
    }
}
