//! Metrics collection for like-notification-service.
//!
//! HTTP request metrics go through the `metrics` facade (installed here as a
//! Prometheus recorder); service outcome counters live in a `prometheus`
//! registry. Both are rendered together on `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static LIKE_NOTIFICATION_RESULTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static LIKE_NOTIFICATION_PROVIDER_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the Prometheus recorder and register service counters. Call once
/// per process.
pub fn init_metrics() -> Result<(), anyhow::Error> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {}", e))?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))?;

    let registry = Registry::new();

    let results_counter = IntCounterVec::new(
        Opts::new(
            "like_notification_results_total",
            "Like notification outcomes by result status",
        ),
        &["status"],
    )?;

    let provider_calls_counter = IntCounterVec::new(
        Opts::new(
            "like_notification_provider_calls_total",
            "Push provider calls by provider and status",
        ),
        &["provider", "status"],
    )?;

    registry.register(Box::new(results_counter.clone()))?;
    registry.register(Box::new(provider_calls_counter.clone()))?;

    PROMETHEUS_REGISTRY
        .set(registry)
        .map_err(|_| anyhow::anyhow!("prometheus registry already initialized"))?;
    LIKE_NOTIFICATION_RESULTS_TOTAL
        .set(results_counter)
        .map_err(|_| anyhow::anyhow!("like_notification_results_total already initialized"))?;
    LIKE_NOTIFICATION_PROVIDER_CALLS_TOTAL
        .set(provider_calls_counter)
        .map_err(|_| {
            anyhow::anyhow!("like_notification_provider_calls_total already initialized")
        })?;

    Ok(())
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Count one orchestrator outcome. No-op before `init_metrics`.
pub fn record_like_result(status: &str) {
    if let Some(counter) = LIKE_NOTIFICATION_RESULTS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record a push provider API call.
pub fn record_provider_call(provider: &str, status: &str) {
    if let Some(counter) = LIKE_NOTIFICATION_PROVIDER_CALLS_TOTAL.get() {
        counter.with_label_values(&[provider, status]).inc();
    }
}
