//! Observability infrastructure for the recommendation service
//!
//! Provides:
//! - Prometheus metrics (recommendation latency, outcomes per recommender, data sizes)
//! - Structured JSON logging with tracing

use crate::reload::LoadReport;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Label used when no recommender could serve the client
pub const NO_RECOMMENDER: &str = "none";

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    recommendation_latency_seconds: Histogram,
    recommendations_total: IntCounterVec,
    empty_recommendations: IntCounter,
    recommendation_errors: IntCounter,
    low_confidence_matches: IntCounter,
    donor_pool_size: IntGauge,
    curve_points: IntGauge,
    locales: IntGauge,
    data_reloads: IntCounter,
    data_reload_failures: IntCounter,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            recommendation_latency_seconds: register_histogram!(
                "taar_recommendation_latency_seconds",
                "Time spent computing a recommendation",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register recommendation_latency_seconds"),

            recommendations_total: register_int_counter_vec!(
                "taar_recommendations_total",
                "Recommendation requests served, by selected recommender",
                &["recommender"]
            )
            .expect("Failed to register recommendations_total"),

            empty_recommendations: register_int_counter!(
                "taar_empty_recommendations_total",
                "Requests answered with an empty recommendation list"
            )
            .expect("Failed to register empty_recommendations"),

            recommendation_errors: register_int_counter!(
                "taar_recommendation_errors_total",
                "Requests that failed with an internal recommendation error"
            )
            .expect("Failed to register recommendation_errors"),

            low_confidence_matches: register_int_counter!(
                "taar_low_confidence_matches_total",
                "Similarity recommendations whose best donor likelihood ratio was below 2.0"
            )
            .expect("Failed to register low_confidence_matches"),

            donor_pool_size: register_int_gauge!(
                "taar_donor_pool_size",
                "Number of donors loaded by the similarity recommender"
            )
            .expect("Failed to register donor_pool_size"),

            curve_points: register_int_gauge!(
                "taar_lr_curve_points",
                "Number of points in the loaded likelihood-ratio curve"
            )
            .expect("Failed to register lr_curve_points"),

            locales: register_int_gauge!(
                "taar_locales",
                "Number of locales in the top add-ons per locale table"
            )
            .expect("Failed to register locales"),

            data_reloads: register_int_counter!(
                "taar_data_reloads_total",
                "Number of completed data reloads"
            )
            .expect("Failed to register data_reloads"),

            data_reload_failures: register_int_counter!(
                "taar_data_reload_failures_total",
                "Number of data reloads that produced no usable recommender"
            )
            .expect("Failed to register data_reload_failures"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_recommendation_latency(&self, duration_secs: f64) {
        self.inner()
            .recommendation_latency_seconds
            .observe(duration_secs);
    }

    /// Count a served request under the recommender that answered it
    pub fn record_recommendation(&self, recommender: Option<&str>, result_len: usize) {
        let label = recommender.unwrap_or(NO_RECOMMENDER);
        self.inner()
            .recommendations_total
            .with_label_values(&[label])
            .inc();
        if result_len == 0 {
            self.inner().empty_recommendations.inc();
        }
    }

    pub fn inc_recommendation_errors(&self) {
        self.inner().recommendation_errors.inc();
    }

    pub fn inc_low_confidence_matches(&self) {
        self.inner().low_confidence_matches.inc();
    }

    /// Publish the sizes of freshly loaded data
    pub fn record_data_load(&self, report: &LoadReport) {
        let inner = self.inner();
        inner.donor_pool_size.set(report.donors as i64);
        inner.curve_points.set(report.curve_points as i64);
        inner.locales.set(report.locales as i64);
        if report.is_empty() {
            inner.data_reload_failures.inc();
        } else {
            inner.data_reloads.inc();
        }
    }

    #[cfg(test)]
    fn recommendations_served(&self, recommender: &str) -> u64 {
        self.inner()
            .recommendations_total
            .with_label_values(&[recommender])
            .get()
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for recommendations,
/// data reloads and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a served recommendation
    pub fn log_recommendation(
        &self,
        client_id: &str,
        recommender: Option<&str>,
        results: usize,
        latency_ms: f64,
    ) {
        info!(
            event = "recommendation_served",
            instance = %self.instance,
            client_id = %client_id,
            recommender = recommender.unwrap_or(NO_RECOMMENDER),
            results = results,
            latency_ms = latency_ms,
            "Served recommendation"
        );
    }

    /// Log the outcome of a data (re)load
    pub fn log_data_reload(&self, report: &LoadReport) {
        if report.is_empty() {
            warn!(
                event = "data_reload_failed",
                instance = %self.instance,
                "No recommender data could be loaded, serving empty recommendations"
            );
        } else {
            info!(
                event = "data_reloaded",
                instance = %self.instance,
                similarity_loaded = report.similarity_loaded,
                donors = report.donors,
                curve_points = report.curve_points,
                locale_loaded = report.locale_loaded,
                locales = report.locales,
                "Recommender data loaded"
            );
        }
    }

    /// Log service startup
    pub fn log_startup(&self, version: &str, recommenders: &[&str]) {
        info!(
            event = "service_started",
            instance = %self.instance,
            service_version = %version,
            recommenders = ?recommenders,
            "Recommendation service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Recommendation service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_metrics_creation() {
        // Metrics live in the global Prometheus registry, so they are only
        // registered once per process however many handles exist.
        let metrics = ServiceMetrics::new();
        let other = ServiceMetrics::new();

        metrics.observe_recommendation_latency(0.002);
        let before = other.recommendations_served("similarity");
        metrics.record_recommendation(Some("similarity"), 3);
        metrics.record_recommendation(None, 0);
        metrics.inc_recommendation_errors();
        metrics.record_data_load(&LoadReport {
            similarity_loaded: true,
            donors: 10,
            curve_points: 4,
            locale_loaded: false,
            locales: 0,
        });

        assert_eq!(other.recommendations_served("similarity"), before + 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
        logger.log_data_reload(&LoadReport::default());
    }
}
