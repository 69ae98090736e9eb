//! Prometheus metrics for the todo service.
//!
//! This module provides:
//! - [`MetricsConfig`]: Configuration for the metrics system
//! - [`init_metrics`]: Install the Prometheus recorder (once per process)
//! - [`metrics_handler`]: Axum handler for the `/metrics` endpoint
//! - Business counters for logins, todo mutations, error documents and
//!   WebSocket traffic
//!
//! # Example
//!
//! ```no_run
//! use todoapi_service_shared::metrics::{init_metrics, metrics_handler, MetricsConfig};
//! use axum::{routing::get, Router};
//!
//! init_metrics(&MetricsConfig::default()).expect("failed to initialize metrics");
//! let app: Router = Router::new().route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Route serving the exposition text.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// `METRICS_ENABLED` (anything but "false" enables) and `METRICS_PATH`.
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let path = std::env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string());
        Self { enabled, path }
    }
}

/// Install the global Prometheus recorder.
///
/// # Errors
///
/// [`MetricsError::Disabled`] when turned off, [`MetricsError::AlreadyInitialized`]
/// on a second call, [`MetricsError::InstallFailed`] if the exporter refuses.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Prometheus exposition text, or a comment line before [`init_metrics`].
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => f.write_str("metrics are disabled"),
            MetricsError::AlreadyInitialized => f.write_str("metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => write!(f, "failed to install metrics recorder: {e}"),
        }
    }
}

impl std::error::Error for MetricsError {}

/// `todoapi_logins_total{outcome}`; outcome is `success` or `failure`.
pub fn record_login(outcome: &'static str) {
    metrics::counter!("todoapi_logins_total", "outcome" => outcome).increment(1);
}

/// `todoapi_todo_mutations_total{operation}`; `create`, `update` or `delete`.
pub fn record_todo_mutation(operation: &'static str) {
    metrics::counter!("todoapi_todo_mutations_total", "operation" => operation).increment(1);
}

/// `todoapi_error_responses_total{status}` for every error document emitted.
pub fn record_error_response(status: u16) {
    metrics::counter!("todoapi_error_responses_total", "status" => status.to_string())
        .increment(1);
}

/// `todoapi_ws_messages_total{event}` for every WebSocket frame handled.
pub fn record_ws_message(event: &str) {
    metrics::counter!("todoapi_ws_messages_total", "event" => event.to_string()).increment(1);
}
