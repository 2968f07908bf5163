//! Query-string parsing.
//!
//! Bad input never fails a request: unknown assets, columns and presets are
//! dropped, and unparseable dates fall back to the next range control.

use chrono::NaiveDate;

use crate::application::{DashboardQuery, RangeSelection};
use crate::domain::analytics::MetricColumn;
use crate::domain::series::AssetId;
use crate::domain::window::Preset;

/// Which range control the user last touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeMode {
    Preset,
    Lookback,
    Custom,
}

impl RangeMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "preset" => Some(Self::Preset),
            "lookback" => Some(Self::Lookback),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Build a [`DashboardQuery`] from decoded query-string pairs.
///
/// Recognized keys: `assets` (repeatable or comma-separated), `group`,
/// `range`, `preset`, `lookback_days`, `from`, `to`, `columns` (repeatable
/// or comma-separated), `detail` and `q`. Other keys are ignored.
#[must_use]
pub fn parse_query(pairs: &[(String, String)]) -> DashboardQuery {
    let mut query = DashboardQuery::default();
    let mut mode = None;
    let mut preset = None;
    let mut lookback = None;
    let mut from = None;
    let mut to = None;

    for (key, value) in pairs {
        let value = value.trim();
        match key.as_str() {
            "assets" | "asset" => {
                for asset in split_list(value).map(AssetId::new) {
                    if !query.assets.contains(&asset) {
                        query.assets.push(asset);
                    }
                }
            }
            "columns" | "column" => {
                for column in split_list(value).filter_map(MetricColumn::parse) {
                    if !query.columns.contains(&column) {
                        query.columns.push(column);
                    }
                }
            }
            "group" => query.group = non_empty(value).map(str::to_string),
            "range" => mode = RangeMode::parse(value),
            "preset" => preset = Preset::parse(value),
            "lookback_days" => lookback = value.parse::<u64>().ok().filter(|d| *d > 0),
            "from" => from = parse_date(value),
            "to" => to = parse_date(value),
            "detail" => query.detail = non_empty(value).map(AssetId::new),
            "q" => query.filter = non_empty(value).map(str::to_string),
            _ => {}
        }
    }

    let preset = preset.map(RangeSelection::Preset);
    let lookback = lookback.map(RangeSelection::Lookback);
    let custom = (from.is_some() || to.is_some()).then_some(RangeSelection::Custom { from, to });

    query.range = match mode {
        Some(RangeMode::Preset) => preset,
        Some(RangeMode::Lookback) => lookback.or(preset),
        Some(RangeMode::Custom) => custom.or(preset),
        None => custom.or(lookback).or(preset),
    };
    query
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.is_empty())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_query_is_default() {
        assert_eq!(parse_query(&[]), DashboardQuery::default());
    }

    #[test]
    fn assets_repeat_and_split() {
        let query = parse_query(&pairs(&[
            ("assets", "AAPL, MSFT"),
            ("assets", "XOM"),
            ("assets", "AAPL"),
            ("assets", ""),
        ]));
        assert_eq!(
            query.assets,
            vec![AssetId::new("AAPL"), AssetId::new("MSFT"), AssetId::new("XOM")]
        );
    }

    #[test]
    fn unknown_columns_are_dropped() {
        let query = parse_query(&pairs(&[
            ("columns", "sharpe"),
            ("columns", "alpha"),
            ("columns", "var_5,total_return"),
        ]));
        assert_eq!(
            query.columns,
            vec![
                MetricColumn::Sharpe,
                MetricColumn::ValueAtRisk,
                MetricColumn::TotalReturn
            ]
        );
    }

    #[test]
    fn text_fields() {
        let query = parse_query(&pairs(&[
            ("group", "Tech"),
            ("detail", " MSFT "),
            ("q", "  "),
            ("unknown", "x"),
        ]));
        assert_eq!(query.group.as_deref(), Some("Tech"));
        assert_eq!(query.detail, Some(AssetId::new("MSFT")));
        assert_eq!(query.filter, None);
    }

    #[test_case(&[("preset", "1y")], Some(RangeSelection::Preset(Preset::OneYear)) ; "preset only")]
    #[test_case(&[("preset", "10y")], None ; "unknown preset")]
    #[test_case(&[("lookback_days", "90")], Some(RangeSelection::Lookback(90)) ; "lookback only")]
    #[test_case(&[("lookback_days", "0")], None ; "zero lookback")]
    #[test_case(&[("from", "2024-02-01")], Some(RangeSelection::Custom { from: Some(date(2024, 2, 1)), to: None }) ; "open ended custom")]
    #[test_case(&[("from", "02/01/2024"), ("preset", "3m")], Some(RangeSelection::Preset(Preset::ThreeMonths)) ; "bad date falls back to preset")]
    #[test_case(&[("range", "preset"), ("preset", "6m"), ("lookback_days", "30"), ("from", "2024-01-01")], Some(RangeSelection::Preset(Preset::SixMonths)) ; "preset mode wins")]
    #[test_case(&[("range", "lookback"), ("preset", "6m"), ("lookback_days", "30")], Some(RangeSelection::Lookback(30)) ; "lookback mode wins")]
    #[test_case(&[("range", "custom"), ("preset", "all"), ("lookback_days", "30"), ("to", "nope")], Some(RangeSelection::Preset(Preset::All)) ; "custom mode with bad dates")]
    fn range_resolution(raw: &[(&str, &str)], expected: Option<RangeSelection>) {
        assert_eq!(parse_query(&pairs(raw)).range, expected);
    }
}
