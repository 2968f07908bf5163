//! HTTP response DTOs.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::application::{DashboardView, MetricsTable};
use crate::domain::analytics::{CorrelatedPair, Highlights, Quadrants, SummaryMetrics};
use crate::domain::errors::ComputationWarning;
use crate::domain::series::AssetId;
use crate::domain::window::{Preset, TimeWindow};

/// Summary metrics for one query.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    /// Analysed window.
    pub window: Option<TimeWindow>,
    /// Preset in effect.
    pub preset: Option<Preset>,
    /// Analysed assets.
    pub assets: Vec<AssetId>,
    /// Metrics of every analysed asset.
    pub metrics: Vec<SummaryMetrics>,
    /// Filtered table rows and columns.
    pub table: MetricsTable,
    /// Headline numbers.
    pub highlights: Highlights,
    /// Risk/return quadrants.
    pub quadrants: Quadrants,
    /// Computation warnings.
    pub warnings: Vec<ComputationWarning>,
    /// Rows skipped while loading.
    pub skipped_rows: usize,
}

impl SummaryResponse {
    /// Build from a computed view.
    #[must_use]
    pub fn from_view(view: DashboardView, skipped_rows: usize) -> Self {
        Self {
            window: view.window,
            preset: view.preset,
            assets: view.selected,
            metrics: view.metrics,
            table: view.table,
            highlights: view.highlights,
            quadrants: view.quadrants,
            warnings: view.warnings,
            skipped_rows,
        }
    }
}

/// Correlation matrix for one query.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationResponse {
    /// Analysed window.
    pub window: Option<TimeWindow>,
    /// Row and column labels.
    pub assets: Vec<AssetId>,
    /// Correlation cells; `null` where undefined.
    pub matrix: Vec<Vec<Option<f64>>>,
    /// Highest correlations, descending.
    pub most_correlated: Vec<CorrelatedPair>,
    /// Lowest correlations, ascending.
    pub least_correlated: Vec<CorrelatedPair>,
    /// Warnings for undefined cells.
    pub warnings: Vec<ComputationWarning>,
}

impl CorrelationResponse {
    /// Build from a computed view.
    #[must_use]
    pub fn from_view(view: DashboardView) -> Self {
        Self {
            window: view.window,
            assets: view.correlation.assets().to_vec(),
            matrix: view.correlation.rows().to_vec(),
            most_correlated: view.ranked_pairs.most,
            least_correlated: view.ranked_pairs.least,
            warnings: view
                .warnings
                .into_iter()
                .filter(|w| {
                    matches!(
                        w,
                        ComputationWarning::InsufficientOverlap { .. }
                            | ComputationWarning::ZeroVariance { .. }
                    )
                })
                .collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Application version.
    pub version: String,
    /// Where the prices were loaded from.
    pub source: String,
    /// Seconds since startup.
    pub uptime_secs: u64,
    /// Loaded assets.
    pub assets: usize,
    /// Loaded price observations.
    pub observations: usize,
    /// Rows skipped while loading.
    pub skipped_rows: usize,
}

/// A CSV download.
#[derive(Debug, Clone)]
pub struct CsvDownload {
    /// Suggested file name.
    pub filename: &'static str,
    /// CSV bytes.
    pub body: Vec<u8>,
}

impl IntoResponse for CsvDownload {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serde() {
        let health = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            source: "data".to_string(),
            uptime_secs: 5,
            assets: 3,
            observations: 750,
            skipped_rows: 1,
        };

        let json = serde_json::to_string(&health).unwrap();
        let parsed: HealthResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.assets, 3);
        assert_eq!(parsed.status, "healthy");
    }

    #[test]
    fn csv_download_headers() {
        let response = CsvDownload {
            filename: "metrics.csv",
            body: b"asset\n".to_vec(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"metrics.csv\""
        );
    }
}
