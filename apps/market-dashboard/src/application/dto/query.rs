//! View queries and panel selection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::analytics::MetricColumn;
use crate::domain::series::AssetId;
use crate::domain::window::Preset;

/// A dashboard panel that can be switched on in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Panel {
    /// Normalized price chart.
    PriceChart,
    /// Risk/return scatter with quadrant lists.
    RiskReturn,
    /// Filterable metrics table.
    MetricsTable,
    /// Range controls and lookback slider.
    TimeRange,
    /// Correlation heatmap and ranked pairs.
    Correlation,
    /// Return histogram and shape statistics of one asset.
    Distribution,
}

impl Panel {
    /// Every panel in page order.
    pub const ALL: [Self; 6] = [
        Self::TimeRange,
        Self::PriceChart,
        Self::RiskReturn,
        Self::MetricsTable,
        Self::Correlation,
        Self::Distribution,
    ];

    /// Configuration key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PriceChart => "price_chart",
            Self::RiskReturn => "risk_return",
            Self::MetricsTable => "metrics_table",
            Self::TimeRange => "time_range",
            Self::Correlation => "correlation",
            Self::Distribution => "distribution",
        }
    }

    /// Section heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::PriceChart => "Normalized Performance (Base 100)",
            Self::RiskReturn => "Risk vs Return",
            Self::MetricsTable => "Metrics",
            Self::TimeRange => "Time Range",
            Self::Correlation => "Correlation",
            Self::Distribution => "Return Distribution",
        }
    }
}

/// Named set of assets offered as a quick selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetGroup {
    /// Group name shown in the selector.
    pub name: String,
    /// Member assets.
    pub assets: Vec<AssetId>,
}

/// How the analysis window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelection {
    /// Preset lookback anchored on the latest date.
    Preset(Preset),
    /// Slider lookback in days anchored on the latest date.
    Lookback(u64),
    /// Explicit bounds; a missing side defaults to the data bound.
    Custom {
        /// First day.
        from: Option<NaiveDate>,
        /// Last day.
        to: Option<NaiveDate>,
    },
}

/// Everything a request can ask of the dashboard.
///
/// Empty selections fall back to the configured defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardQuery {
    /// Explicitly selected assets.
    pub assets: Vec<AssetId>,
    /// Named group used when no assets are selected.
    pub group: Option<String>,
    /// Time range. `None` uses the configured default preset.
    pub range: Option<RangeSelection>,
    /// Metrics table columns.
    pub columns: Vec<MetricColumn>,
    /// Asset shown in the distribution panel.
    pub detail: Option<AssetId>,
    /// Case-insensitive substring filter on table rows.
    pub filter: Option<String>,
}
