//! Computed dashboard views.

use serde::Serialize;

use super::query::Panel;
use crate::domain::analytics::{
    CorrelationMatrix, DistributionStats, Highlights, MetricColumn, Quadrants, RankedPairs,
    SummaryMetrics,
};
use crate::domain::errors::ComputationWarning;
use crate::domain::series::{AssetId, PriceTable};
use crate::domain::window::{Preset, TimeWindow};

/// Rows and columns of the metrics table after filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsTable {
    /// Visible columns in display order.
    pub columns: Vec<MetricColumn>,
    /// Rows matching the filter.
    pub rows: Vec<SummaryMetrics>,
    /// Active filter text.
    pub filter: Option<String>,
}

/// Everything needed to render one dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Assets the data offers.
    pub available: Vec<AssetId>,
    /// Assets analysed in this view.
    pub selected: Vec<AssetId>,
    /// Group the selection came from.
    pub group: Option<String>,
    /// Full span of the loaded data for the selection.
    pub bounds: Option<TimeWindow>,
    /// Analysed window.
    pub window: Option<TimeWindow>,
    /// Preset in effect, if the window came from one.
    pub preset: Option<Preset>,
    /// Prices inside the window.
    pub prices: PriceTable,
    /// Prices inside the window rebased to 100.
    pub normalized: PriceTable,
    /// Summary metrics of every selected asset.
    pub metrics: Vec<SummaryMetrics>,
    /// Filtered metrics table.
    pub table: MetricsTable,
    /// Return correlation.
    pub correlation: CorrelationMatrix,
    /// Most and least correlated pairs.
    pub ranked_pairs: RankedPairs,
    /// Risk/return quadrants.
    pub quadrants: Quadrants,
    /// Headline numbers.
    pub highlights: Highlights,
    /// Distribution of the detail asset.
    pub distribution: Option<DistributionStats>,
    /// Problems found while computing the view.
    pub warnings: Vec<ComputationWarning>,
    /// Enabled panels in page order.
    pub panels: Vec<Panel>,
}

impl DashboardView {
    /// Whether the view has anything to show.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Whether `panel` is enabled.
    #[must_use]
    pub fn shows(&self, panel: Panel) -> bool {
        self.panels.contains(&panel)
    }

    /// Lookback length of the window in days, for the slider.
    #[must_use]
    pub fn lookback_days(&self) -> i64 {
        self.window.map_or(0, |w| w.span_days() - 1)
    }
}
