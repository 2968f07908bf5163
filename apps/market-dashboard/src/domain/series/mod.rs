//! Price and return series.
//!
//! A [`PriceTable`] maps each asset to a [`PriceSeries`] whose dates are
//! strictly increasing and whose prices are finite and positive. Tables are
//! built once at startup and only ever read or windowed afterwards.

mod returns;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::RowWarning;
use super::window::TimeWindow;

pub use returns::{ReturnSeries, ReturnTable, compute_returns, normalize_base100};

// =============================================================================
// Asset Identifier
// =============================================================================

/// Asset identifier such as a ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Create an identifier, trimming surrounding whitespace.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_string())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// Observations and Series
// =============================================================================

/// A dated value: a closing price or a return.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    /// Calendar day.
    pub date: NaiveDate,
    /// Observed value.
    pub value: f64,
}

impl Observation {
    /// Create an observation.
    #[must_use]
    pub const fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Closing prices of one asset, strictly increasing in date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    asset: AssetId,
    points: Vec<Observation>,
}

impl PriceSeries {
    /// Asset identifier.
    #[must_use]
    pub const fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Observations in date order.
    #[must_use]
    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First observation.
    #[must_use]
    pub fn first(&self) -> Option<&Observation> {
        self.points.first()
    }

    /// Last observation.
    #[must_use]
    pub fn last(&self) -> Option<&Observation> {
        self.points.last()
    }

    /// Sub-series restricted to `window`.
    #[must_use]
    pub fn window(&self, window: &TimeWindow) -> Self {
        let points = self
            .points
            .iter()
            .filter(|p| window.contains(p.date))
            .copied()
            .collect();
        Self {
            asset: self.asset.clone(),
            points,
        }
    }
}

/// Whether `price` is an acceptable closing price.
#[must_use]
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

// =============================================================================
// Price Table
// =============================================================================

/// Closing prices of several assets, keyed by asset in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: BTreeMap<AssetId, PriceSeries>,
}

impl PriceTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from already validated series. Empty series are dropped.
    #[must_use]
    pub fn from_series(series: impl IntoIterator<Item = PriceSeries>) -> Self {
        let series = series
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| (s.asset.clone(), s))
            .collect();
        Self { series }
    }

    /// Series for `asset`.
    #[must_use]
    pub fn get(&self, asset: &AssetId) -> Option<&PriceSeries> {
        self.series.get(asset)
    }

    /// Iterate over series in asset order.
    pub fn iter(&self) -> impl Iterator<Item = &PriceSeries> {
        self.series.values()
    }

    /// Asset identifiers in sorted order.
    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.series.keys()
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the table holds no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of (date, asset) observations.
    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.series.values().map(PriceSeries::len).sum()
    }

    /// Distinct dates across all assets, ascending.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|s| s.points.iter().map(|p| p.date))
            .collect();
        dates.into_iter().collect()
    }

    /// Earliest and latest date across all assets.
    #[must_use]
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.series.values().filter_map(|s| s.first()).map(|p| p.date).min()?;
        let last = self.series.values().filter_map(|s| s.last()).map(|p| p.date).max()?;
        Some((first, last))
    }

    /// Table restricted to the given assets. Unknown assets are ignored.
    #[must_use]
    pub fn select(&self, assets: &[AssetId]) -> Self {
        let series = assets
            .iter()
            .filter_map(|a| self.series.get_key_value(a))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { series }
    }

    /// Table restricted to `window`. Assets left without observations are dropped.
    #[must_use]
    pub fn window(&self, window: &TimeWindow) -> Self {
        Self::from_series(self.series.values().map(|s| s.window(window)))
    }
}

impl<'a> IntoIterator for &'a PriceTable {
    type Item = &'a PriceSeries;
    type IntoIter = std::collections::btree_map::Values<'a, AssetId, PriceSeries>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.values()
    }
}

// =============================================================================
// Table Builder
// =============================================================================

/// Accumulates raw rows and produces a [`PriceTable`] that upholds the
/// ordering and uniqueness invariants.
#[derive(Debug, Default)]
pub struct PriceTableBuilder {
    rows: BTreeMap<AssetId, BTreeMap<NaiveDate, f64>>,
}

impl PriceTableBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a price. Returns `false` when the (date, asset) pair was
    /// already present, in which case the first value is kept.
    ///
    /// Callers validate the price with [`is_valid_price`] beforehand.
    pub fn push(&mut self, asset: AssetId, date: NaiveDate, price: f64) -> bool {
        let prices = self.rows.entry(asset).or_default();
        if prices.contains_key(&date) {
            return false;
        }
        prices.insert(date, price);
        true
    }

    /// Number of rows recorded so far.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> PriceTable {
        let series = self.rows.into_iter().map(|(asset, prices)| PriceSeries {
            asset,
            points: prices
                .into_iter()
                .map(|(date, value)| Observation::new(date, value))
                .collect(),
        });
        PriceTable::from_series(series)
    }
}

/// Result of loading price files: the table plus any skipped rows.
#[derive(Debug, Clone, Default)]
pub struct LoadedPrices {
    /// Loaded prices.
    pub table: PriceTable,
    /// Rows that were skipped while reading.
    pub warnings: Vec<RowWarning>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn asset_id_trims_whitespace() {
        assert_eq!(AssetId::new("  AAPL ").as_str(), "AAPL");
        assert_eq!(AssetId::from("SPY").to_string(), "SPY");
    }

    #[test]
    fn builder_sorts_and_keeps_first_duplicate() {
        let mut builder = PriceTableBuilder::new();
        assert!(builder.push(AssetId::new("AAPL"), date(2024, 1, 3), 101.0));
        assert!(builder.push(AssetId::new("AAPL"), date(2024, 1, 2), 100.0));
        assert!(!builder.push(AssetId::new("AAPL"), date(2024, 1, 2), 999.0));
        assert_eq!(builder.row_count(), 2);

        let table = builder.build();
        let series = table.get(&AssetId::new("AAPL")).unwrap();
        let values: Vec<f64> = series.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![100.0, 101.0]);
        assert_eq!(series.first().unwrap().date, date(2024, 1, 2));
    }

    #[test]
    fn table_bounds_and_dates() {
        let mut builder = PriceTableBuilder::new();
        builder.push(AssetId::new("A"), date(2024, 1, 2), 10.0);
        builder.push(AssetId::new("A"), date(2024, 1, 4), 11.0);
        builder.push(AssetId::new("B"), date(2024, 1, 3), 20.0);
        builder.push(AssetId::new("B"), date(2024, 1, 5), 21.0);
        let table = builder.build();

        assert_eq!(
            table.date_bounds(),
            Some((date(2024, 1, 2), date(2024, 1, 5)))
        );
        assert_eq!(table.dates().len(), 4);
        assert_eq!(table.observation_count(), 4);
    }

    #[test]
    fn window_drops_assets_without_points() {
        let mut builder = PriceTableBuilder::new();
        builder.push(AssetId::new("A"), date(2024, 1, 2), 10.0);
        builder.push(AssetId::new("A"), date(2024, 2, 2), 11.0);
        builder.push(AssetId::new("B"), date(2023, 6, 1), 20.0);
        let table = builder.build();

        let window = TimeWindow::new(date(2024, 1, 1), date(2024, 1, 31));
        let windowed = table.window(&window);

        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed.get(&AssetId::new("A")).unwrap().len(), 1);
    }

    #[test]
    fn select_ignores_unknown_assets() {
        let mut builder = PriceTableBuilder::new();
        builder.push(AssetId::new("A"), date(2024, 1, 2), 10.0);
        builder.push(AssetId::new("B"), date(2024, 1, 2), 20.0);
        let table = builder.build();

        let selected = table.select(&[AssetId::new("B"), AssetId::new("ZZZ")]);
        let assets: Vec<&str> = selected.assets().map(AssetId::as_str).collect();
        assert_eq!(assets, vec!["B"]);
    }
}
