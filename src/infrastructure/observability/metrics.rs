//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use super::config::MetricsConfig;
use crate::domain::fetch::CacheStatus;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
///
/// Returns `None` when disabled or when a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = match builder_for(config) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::error!("Invalid metrics configuration: {}", e);
            return None;
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            gauge!("npmx_api_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Applies the configured duration buckets; without them durations are
/// exported as summaries
fn builder_for(config: &MetricsConfig) -> Result<PrometheusBuilder, BuildError> {
    let builder = PrometheusBuilder::new();

    if config.duration_buckets.is_empty() {
        return Ok(builder);
    }

    builder.set_buckets_for_metric(
        Matcher::Suffix("duration_seconds".to_string()),
        &config.duration_buckets,
    )
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
///
/// `path` should be the matched route pattern, not the raw URI, so package
/// names never become label values.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record how a cached read was served
pub fn record_cache_outcome(namespace: &str, outcome: CacheStatus) {
    counter!(
        "npmx_cache_requests_total",
        "namespace" => namespace.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record an outbound request to an external service
///
/// `status` is `None` when the request failed before a response arrived.
pub fn record_upstream_request(service: &str, status: Option<u16>, duration: Duration) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.to_string());
    let labels = [("service", service.to_string()), ("status", status)];

    counter!("npmx_upstream_requests_total", &labels).increment(1);
    histogram!("npmx_upstream_request_duration_seconds", &labels)
        .record(duration.as_secs_f64());
}
