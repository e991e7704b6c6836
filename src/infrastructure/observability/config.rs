//! Observability configuration
//!
//! Read from the `observability` section of the app config, e.g.
//! `APP__OBSERVABILITY__TRACING__ENVIRONMENT=staging`.

use serde::Deserialize;

/// Upper bounds in seconds for request duration histograms.
///
/// Registry and CDN calls usually land between 20ms and 2s; the tail covers
/// cold GitHub and jsDelivr lookups.
pub const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

/// OpenTelemetry span export
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    /// OTLP gRPC endpoint
    pub otlp_endpoint: String,
    pub service_name: String,
    /// Reported as `deployment.environment` so preview and production
    /// deployments can share one collector
    pub environment: Option<String>,
    /// Fraction of traces kept, clamped to 0.0..=1.0
    pub sampling_ratio: f64,
}

/// Prometheus exposition
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
    /// Histogram buckets for every `*_duration_seconds` metric. Empty falls
    /// back to summaries.
    pub duration_buckets: Vec<f64>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "npmx-api".to_string(),
            environment: None,
            sampling_ratio: 1.0,
        }
    }
}

impl TracingConfig {
    /// OpenTelemetry resource attributes for exported spans
    pub fn resource_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attributes = vec![
            ("service.name", self.service_name.clone()),
            ("service.version", env!("CARGO_PKG_VERSION").to_string()),
        ];

        if let Some(environment) = self.environment.as_deref().filter(|e| !e.is_empty()) {
            attributes.push(("deployment.environment", environment.to_string()));
        }

        attributes
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
            duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ObservabilityConfig::default();

        assert!(!config.tracing.enabled);
        assert_eq!(config.tracing.service_name, "npmx-api");
        assert!(config.tracing.environment.is_none());
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.path, "/metrics");
        assert_eq!(config.metrics.duration_buckets, DEFAULT_DURATION_BUCKETS);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ObservabilityConfig = serde_json::from_str(
            r#"{"tracing": {"enabled": true, "environment": "preview"}, "metrics": {"duration_buckets": [0.1, 1.0]}}"#,
        )
        .unwrap();

        assert!(config.tracing.enabled);
        assert_eq!(config.tracing.environment.as_deref(), Some("preview"));
        assert_eq!(config.tracing.service_name, "npmx-api");
        assert_eq!(config.metrics.duration_buckets, vec![0.1, 1.0]);
        assert_eq!(config.metrics.path, "/metrics");
    }

    #[test]
    fn test_resource_attributes() {
        let config = TracingConfig::default();
        let keys: Vec<_> = config.resource_attributes().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["service.name", "service.version"]);

        let config = TracingConfig {
            environment: Some("production".to_string()),
            ..Default::default()
        };
        assert!(
            config
                .resource_attributes()
                .contains(&("deployment.environment", "production".to_string()))
        );

        let config = TracingConfig {
            environment: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(config.resource_attributes().len(), 2);
    }
}
