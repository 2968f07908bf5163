//! Dashboard Service
//!
//! Holds the price table loaded at startup and derives every view from it.
//! The table is never mutated after loading, so one service instance can be
//! shared by all requests.

use tracing::{debug, info, warn};

use crate::application::dto::{
    AssetGroup, DashboardQuery, DashboardView, MetricsTable, Panel, RangeSelection,
};
use crate::application::ports::PriceSource;
use crate::domain::analytics::{
    AnalyticsParams, MetricColumn, SummaryMetrics, classify_quadrants, compute_correlation,
    describe_distribution, highlights, ranked_pairs, summarize,
};
use crate::domain::errors::{DataError, RowWarning};
use crate::domain::series::{AssetId, LoadedPrices, PriceTable, compute_returns, normalize_base100};
use crate::domain::window::{Preset, TimeWindow};

/// What the service computes and which panels it offers.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSettings {
    /// Analytics parameters.
    pub analytics: AnalyticsParams,
    /// Enabled panels in page order.
    pub panels: Vec<Panel>,
    /// Named asset groups.
    pub groups: Vec<AssetGroup>,
    /// Preset used when a query names no range.
    pub default_preset: Preset,
    /// Table columns used when a query names none.
    pub default_columns: Vec<MetricColumn>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            analytics: AnalyticsParams::default(),
            panels: Panel::ALL.to_vec(),
            groups: Vec::new(),
            default_preset: Preset::All,
            default_columns: MetricColumn::DEFAULTS.to_vec(),
        }
    }
}

/// Answers dashboard queries from an immutable price table.
#[derive(Debug)]
pub struct DashboardService {
    source: String,
    prices: PriceTable,
    load_warnings: Vec<RowWarning>,
    settings: DashboardSettings,
}

impl DashboardService {
    /// Load prices from `source`.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`DataError`], and fails with
    /// [`DataError::DataFormat`] when no valid price row was found.
    pub fn load(source: &dyn PriceSource, settings: DashboardSettings) -> Result<Self, DataError> {
        let origin = source.describe();
        let loaded = source.load()?;

        if loaded.table.is_empty() {
            return Err(DataError::format(&origin, "no valid price rows"));
        }

        for warning in &loaded.warnings {
            warn!(file = %warning.file, line = warning.line, reason = %warning.reason, "Skipped row");
        }
        info!(
            source = %origin,
            assets = loaded.table.len(),
            observations = loaded.table.observation_count(),
            skipped_rows = loaded.warnings.len(),
            "Loaded price data"
        );

        Ok(Self::new(origin, loaded, settings))
    }

    /// Build a service from already loaded prices.
    #[must_use]
    pub fn new(source: impl Into<String>, loaded: LoadedPrices, settings: DashboardSettings) -> Self {
        Self {
            source: source.into(),
            prices: loaded.table,
            load_warnings: loaded.warnings,
            settings,
        }
    }

    /// Where the prices came from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Loaded prices.
    #[must_use]
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Rows skipped while loading.
    #[must_use]
    pub fn load_warnings(&self) -> &[RowWarning] {
        &self.load_warnings
    }

    /// Active settings.
    #[must_use]
    pub const fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    /// Compute the view for `query`.
    #[must_use]
    pub fn view(&self, query: &DashboardQuery) -> DashboardView {
        let (selected, group) = self.resolve_selection(query);
        let selection = self.prices.select(&selected);
        let bounds = selection
            .date_bounds()
            .map(|(from, to)| TimeWindow::new(from, to));

        let range = query
            .range
            .unwrap_or(RangeSelection::Preset(self.settings.default_preset));
        let window = bounds.map(|b| resolve_window(range, b));
        let preset = match range {
            RangeSelection::Preset(p) => Some(p),
            _ => None,
        };

        let prices = window.map_or_else(PriceTable::new, |w| selection.window(&w));
        let returns = compute_returns(&prices);

        let params = &self.settings.analytics;
        let summary = summarize(&prices, &returns, params);
        let correlation = compute_correlation(&returns);
        let ranked = ranked_pairs(&correlation.matrix, params.ranked_pairs);

        let detail = query
            .detail
            .as_ref()
            .filter(|a| returns.get(a).is_some())
            .or_else(|| returns.assets().next());
        let distribution = detail
            .and_then(|a| returns.get(a))
            .map(|r| describe_distribution(r, params.histogram_bins));

        let mut warnings = summary.warnings;
        for warning in correlation.warnings {
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }

        debug!(
            assets = prices.len(),
            window = ?window,
            warnings = warnings.len(),
            "Computed dashboard view"
        );

        DashboardView {
            available: self.prices.assets().cloned().collect(),
            selected: prices.assets().cloned().collect(),
            group,
            bounds,
            window,
            preset,
            normalized: normalize_base100(&prices),
            table: self.metrics_table(&summary.metrics, query),
            quadrants: classify_quadrants(&summary.metrics),
            highlights: highlights(&summary.metrics, prices.dates().len()),
            metrics: summary.metrics,
            correlation: correlation.matrix,
            ranked_pairs: ranked,
            distribution,
            warnings,
            panels: self.settings.panels.clone(),
            prices,
        }
    }

    /// Explicit assets win over a group; unknown names are dropped. An empty
    /// result falls back to every loaded asset.
    fn resolve_selection(&self, query: &DashboardQuery) -> (Vec<AssetId>, Option<String>) {
        let known = |assets: &[AssetId]| -> Vec<AssetId> {
            assets
                .iter()
                .filter(|a| self.prices.get(a).is_some())
                .cloned()
                .collect()
        };

        let explicit = known(&query.assets);
        if !explicit.is_empty() {
            return (explicit, None);
        }

        if let Some(group) = query
            .group
            .as_deref()
            .and_then(|name| self.settings.groups.iter().find(|g| g.name == name))
        {
            let members = known(&group.assets);
            if !members.is_empty() {
                return (members, Some(group.name.clone()));
            }
        }

        (self.prices.assets().cloned().collect(), None)
    }

    fn metrics_table(&self, metrics: &[SummaryMetrics], query: &DashboardQuery) -> MetricsTable {
        let columns = if query.columns.is_empty() {
            self.settings.default_columns.clone()
        } else {
            query.columns.clone()
        };

        let filter = query
            .filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        let needle = filter.as_deref().map(str::to_lowercase);

        let rows = metrics
            .iter()
            .filter(|m| {
                needle
                    .as_deref()
                    .is_none_or(|n| m.asset.as_str().to_lowercase().contains(n))
            })
            .cloned()
            .collect();

        MetricsTable {
            columns,
            rows,
            filter,
        }
    }
}

fn resolve_window(range: RangeSelection, bounds: TimeWindow) -> TimeWindow {
    match range {
        RangeSelection::Preset(preset) => TimeWindow::from_preset(preset, (bounds.from, bounds.to)),
        RangeSelection::Lookback(days) => TimeWindow::lookback(bounds.to, days).clamp(bounds),
        RangeSelection::Custom { from, to } => {
            TimeWindow::new(from.unwrap_or(bounds.from), to.unwrap_or(bounds.to)).clamp(bounds)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
