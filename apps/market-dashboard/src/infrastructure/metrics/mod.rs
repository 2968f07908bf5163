//! Prometheus Metrics Module
//!
//! # Metrics Categories
//!
//! - **Requests**: dashboard renders and exports by route
//! - **Latency**: time spent computing and rendering a view
//! - **Data**: loaded assets and observations, rows skipped while loading
//!
//! Metrics are exposed at `/metrics` on the dashboard server.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Later calls return the handle installed by the first one.
///
/// # Panics
///
/// Panics if another global recorder was installed first.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "market_dashboard_requests_total",
        "Dashboard requests served by route"
    );
    describe_histogram!(
        "market_dashboard_render_seconds",
        "Time to compute and render a view"
    );
    describe_counter!(
        "market_dashboard_rows_skipped_total",
        "Input rows skipped while loading price files"
    );
    describe_gauge!("market_dashboard_assets_loaded", "Assets loaded at startup");
    describe_gauge!(
        "market_dashboard_observations_loaded",
        "Price observations loaded at startup"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Metric labels for served routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// HTML dashboard page.
    Page,
    /// JSON summary.
    Summary,
    /// JSON correlation.
    Correlation,
    /// Metrics CSV download.
    MetricsExport,
    /// Prices CSV download.
    PricesExport,
}

impl Route {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Summary => "summary",
            Self::Correlation => "correlation",
            Self::MetricsExport => "metrics_export",
            Self::PricesExport => "prices_export",
        }
    }
}

/// Record a served request and how long the view took.
pub fn record_request(route: Route, duration: Duration) {
    counter!("market_dashboard_requests_total", "route" => route.as_str()).increment(1);
    histogram!("market_dashboard_render_seconds", "route" => route.as_str())
        .record(duration.as_secs_f64());
}

/// Record rows skipped while loading.
pub fn record_rows_skipped(count: u64) {
    counter!("market_dashboard_rows_skipped_total").increment(count);
}

/// Update the loaded data gauges.
#[allow(clippy::cast_precision_loss)]
pub fn set_loaded(assets: usize, observations: usize) {
    gauge!("market_dashboard_assets_loaded").set(assets as f64);
    gauge!("market_dashboard_observations_loaded").set(observations as f64);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_as_str() {
        assert_eq!(Route::Page.as_str(), "page");
        assert_eq!(Route::Summary.as_str(), "summary");
        assert_eq!(Route::Correlation.as_str(), "correlation");
        assert_eq!(Route::MetricsExport.as_str(), "metrics_export");
        assert_eq!(Route::PricesExport.as_str(), "prices_export");
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        record_request(Route::Page, Duration::from_millis(3));
        record_rows_skipped(2);
        set_loaded(3, 300);
    }
}
