//! Return series derived from closing prices.

use std::collections::BTreeMap;

use super::{AssetId, Observation, PriceSeries, PriceTable};

/// Day-over-day relative changes of one asset.
///
/// Each observation is dated on the later of the two prices it was derived
/// from, so the first price date never appears.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    asset: AssetId,
    points: Vec<Observation>,
}

impl ReturnSeries {
    /// Derive returns from a price series.
    #[must_use]
    pub fn from_prices(prices: &PriceSeries) -> Self {
        let points = prices
            .points()
            .windows(2)
            .map(|pair| Observation::new(pair[1].date, pair[1].value / pair[0].value - 1.0))
            .collect();
        Self {
            asset: prices.asset().clone(),
            points,
        }
    }

    /// Asset identifier.
    #[must_use]
    pub const fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Returns in date order.
    #[must_use]
    pub fn points(&self) -> &[Observation] {
        &self.points
    }

    /// Return values without dates.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Number of returns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no returns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Return series for several assets, keyed by asset in sorted order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnTable {
    series: BTreeMap<AssetId, ReturnSeries>,
}

impl ReturnTable {
    /// Series for `asset`.
    #[must_use]
    pub fn get(&self, asset: &AssetId) -> Option<&ReturnSeries> {
        self.series.get(asset)
    }

    /// Iterate over series in asset order.
    pub fn iter(&self) -> impl Iterator<Item = &ReturnSeries> {
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
}

/// Derive the return series of every asset in `prices`.
///
/// For each asset `return[t] = price[t] / price[t-1] - 1`. An asset with
/// `N` prices yields `N - 1` returns; single-price assets are kept with an
/// empty series so they still show up in per-asset views.
#[must_use]
pub fn compute_returns(prices: &PriceTable) -> ReturnTable {
    let series = prices
        .iter()
        .map(|s| (s.asset().clone(), ReturnSeries::from_prices(s)))
        .collect();
    ReturnTable { series }
}

/// Rescale each asset so its first price equals 100.
#[must_use]
pub fn normalize_base100(prices: &PriceTable) -> PriceTable {
    PriceTable::from_series(prices.iter().map(|s| {
        let base = s.first().map_or(1.0, |p| p.value);
        PriceSeries {
            asset: s.asset().clone(),
            points: s
                .points()
                .iter()
                .map(|p| Observation::new(p.date, p.value / base * 100.0))
                .collect(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::series::PriceTableBuilder;

    fn table(asset: &str, prices: &[f64]) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut builder = PriceTableBuilder::new();
        for (i, price) in prices.iter().enumerate() {
            builder.push(
                AssetId::new(asset),
                start + chrono::Days::new(i as u64),
                *price,
            );
        }
        builder.build()
    }

    fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }

    #[test]
    fn returns_match_worked_example() {
        let returns = compute_returns(&table("X", &[100.0, 110.0, 99.0]));
        let series = returns.get(&AssetId::new("X")).unwrap();
        let rounded: Vec<f64> = series.values().into_iter().map(round2).collect();
        assert_eq!(rounded, vec![0.10, -0.10]);
    }

    #[test]
    fn first_date_is_dropped() {
        let prices = table("X", &[100.0, 101.0, 102.0, 103.0]);
        let returns = compute_returns(&prices);
        let series = returns.get(&AssetId::new("X")).unwrap();

        assert_eq!(series.len(), 3);
        let first_price_date = prices.get(&AssetId::new("X")).unwrap().first().unwrap().date;
        assert!(series.points().iter().all(|p| p.date > first_price_date));
    }

    #[test]
    fn single_price_yields_empty_series() {
        let returns = compute_returns(&table("X", &[100.0]));
        assert!(returns.get(&AssetId::new("X")).unwrap().is_empty());
    }

    #[test]
    fn normalization_starts_at_100() {
        let normalized = normalize_base100(&table("X", &[50.0, 75.0, 25.0]));
        let values: Vec<f64> = normalized
            .get(&AssetId::new("X"))
            .unwrap()
            .points()
            .iter()
            .map(|p| p.value)
            .collect();
        assert_eq!(values, vec![100.0, 150.0, 50.0]);
    }
}
