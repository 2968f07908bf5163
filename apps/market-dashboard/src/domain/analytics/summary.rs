//! Per-asset summary metrics.

use serde::{Deserialize, Serialize};

use super::constants::{DEFAULT_HISTOGRAM_BINS, DEFAULT_RANKED_PAIRS, TRADING_DAYS, VAR_LEVEL};
use super::math::{is_degenerate, max_drawdown, mean, quantile, sample_std, sample_variance};
use crate::domain::errors::ComputationWarning;
use crate::domain::series::{AssetId, PriceTable, ReturnTable};

/// Parameters shared by the analytics calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsParams {
    /// Return periods per year used for annualization.
    pub periods_per_year: u32,
    /// Annual risk-free rate as a fraction (0.05 = 5%).
    pub risk_free_rate: f64,
    /// Histogram bins for the return distribution.
    pub histogram_bins: usize,
    /// Pairs listed in each correlation ranking.
    pub ranked_pairs: usize,
}

impl Default for AnalyticsParams {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS,
            risk_free_rate: 0.0,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            ranked_pairs: DEFAULT_RANKED_PAIRS,
        }
    }
}

impl AnalyticsParams {
    /// Risk-free rate converted to one return period.
    #[must_use]
    pub fn periodic_risk_free(&self) -> f64 {
        if self.risk_free_rate == 0.0 || self.periods_per_year == 0 {
            return 0.0;
        }
        (1.0 + self.risk_free_rate).powf(1.0 / f64::from(self.periods_per_year)) - 1.0
    }

    fn annualization(&self) -> f64 {
        f64::from(self.periods_per_year).sqrt()
    }
}

/// Scalar aggregates of one asset over the analysed window.
///
/// Fractions are stored raw (0.1 = 10%). Values that cannot be computed
/// from the available returns are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    /// Asset identifier.
    pub asset: AssetId,
    /// First closing price in the window.
    pub initial_price: f64,
    /// Last closing price in the window.
    pub final_price: f64,
    /// Final over initial price, minus one.
    pub total_return: f64,
    /// Mean daily return.
    pub mean_return: Option<f64>,
    /// Sample standard deviation of daily returns.
    pub daily_volatility: Option<f64>,
    /// Daily volatility scaled by the square root of periods per year.
    pub annual_volatility: Option<f64>,
    /// Annualized mean excess return over volatility.
    pub sharpe: Option<f64>,
    /// Annualized mean excess return over the deviation of losing days.
    pub sortino: Option<f64>,
    /// Historical 5% quantile of daily returns.
    pub value_at_risk: Option<f64>,
    /// Best daily return.
    pub max_return: Option<f64>,
    /// Worst daily return.
    pub min_return: Option<f64>,
    /// Deepest decline of the compounded return curve (non-positive).
    pub max_drawdown: Option<f64>,
    /// Number of returns used.
    pub observations: usize,
}

/// Column of the metrics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricColumn {
    /// First price.
    InitialPrice,
    /// Last price.
    FinalPrice,
    /// Total return (%).
    TotalReturn,
    /// Mean daily return (%).
    MeanReturn,
    /// Daily volatility (%).
    DailyVolatility,
    /// Annualized volatility (%).
    AnnualVolatility,
    /// Sharpe ratio.
    Sharpe,
    /// Sortino ratio.
    Sortino,
    /// 5% Value at Risk (%).
    #[serde(rename = "var_5")]
    ValueAtRisk,
    /// Best day (%).
    MaxReturn,
    /// Worst day (%).
    MinReturn,
    /// Maximum drawdown (%).
    MaxDrawdown,
    /// Number of returns.
    Observations,
}

/// How a column's value is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Price level.
    Price,
    /// Fraction shown as a percentage.
    Percent,
    /// Dimensionless ratio.
    Ratio,
    /// Integer count.
    Count,
}

impl MetricColumn {
    /// Every column in display order.
    pub const ALL: [Self; 13] = [
        Self::InitialPrice,
        Self::FinalPrice,
        Self::TotalReturn,
        Self::MeanReturn,
        Self::DailyVolatility,
        Self::AnnualVolatility,
        Self::Sharpe,
        Self::Sortino,
        Self::ValueAtRisk,
        Self::MaxReturn,
        Self::MinReturn,
        Self::MaxDrawdown,
        Self::Observations,
    ];

    /// Columns shown when none are selected.
    pub const DEFAULTS: [Self; 4] = [
        Self::TotalReturn,
        Self::AnnualVolatility,
        Self::Sharpe,
        Self::MaxDrawdown,
    ];

    /// Key used in query strings, configuration and CSV headers.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::InitialPrice => "initial_price",
            Self::FinalPrice => "final_price",
            Self::TotalReturn => "total_return",
            Self::MeanReturn => "mean_return",
            Self::DailyVolatility => "daily_volatility",
            Self::AnnualVolatility => "annual_volatility",
            Self::Sharpe => "sharpe",
            Self::Sortino => "sortino",
            Self::ValueAtRisk => "var_5",
            Self::MaxReturn => "max_return",
            Self::MinReturn => "min_return",
            Self::MaxDrawdown => "max_drawdown",
            Self::Observations => "observations",
        }
    }

    /// Column heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InitialPrice => "Initial Price",
            Self::FinalPrice => "Final Price",
            Self::TotalReturn => "Return (%)",
            Self::MeanReturn => "Mean Daily Return (%)",
            Self::DailyVolatility => "Daily Volatility (%)",
            Self::AnnualVolatility => "Annual Volatility (%)",
            Self::Sharpe => "Sharpe",
            Self::Sortino => "Sortino",
            Self::ValueAtRisk => "VaR 5% (%)",
            Self::MaxReturn => "Max Return (%)",
            Self::MinReturn => "Min Return (%)",
            Self::MaxDrawdown => "Max Drawdown (%)",
            Self::Observations => "Observations",
        }
    }

    /// Display kind.
    #[must_use]
    pub const fn kind(self) -> ColumnKind {
        match self {
            Self::InitialPrice | Self::FinalPrice => ColumnKind::Price,
            Self::Sharpe | Self::Sortino => ColumnKind::Ratio,
            Self::Observations => ColumnKind::Count,
            _ => ColumnKind::Percent,
        }
    }

    /// Parse a column key.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let key = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl SummaryMetrics {
    /// Raw value of `column`.
    #[must_use]
    pub fn value(&self, column: MetricColumn) -> Option<f64> {
        match column {
            MetricColumn::InitialPrice => Some(self.initial_price),
            MetricColumn::FinalPrice => Some(self.final_price),
            MetricColumn::TotalReturn => Some(self.total_return),
            MetricColumn::MeanReturn => self.mean_return,
            MetricColumn::DailyVolatility => self.daily_volatility,
            MetricColumn::AnnualVolatility => self.annual_volatility,
            MetricColumn::Sharpe => self.sharpe,
            MetricColumn::Sortino => self.sortino,
            MetricColumn::ValueAtRisk => self.value_at_risk,
            MetricColumn::MaxReturn => self.max_return,
            MetricColumn::MinReturn => self.min_return,
            MetricColumn::MaxDrawdown => self.max_drawdown,
            MetricColumn::Observations => Some(self.observations as f64),
        }
    }
}

/// Summary metrics for every asset present in both tables.
#[derive(Debug, Clone, Default)]
pub struct SummaryReport {
    /// Metrics in asset order.
    pub metrics: Vec<SummaryMetrics>,
    /// Assets whose dispersion metrics could not be computed.
    pub warnings: Vec<ComputationWarning>,
}

/// Compute [`SummaryMetrics`] for each asset.
///
/// `returns` must be derived from `prices` over the same window.
#[must_use]
pub fn summarize(prices: &PriceTable, returns: &ReturnTable, params: &AnalyticsParams) -> SummaryReport {
    let mut report = SummaryReport::default();
    let rf = params.periodic_risk_free();
    let scale = params.annualization();

    for series in prices {
        let (Some(first), Some(last)) = (series.first(), series.last()) else {
            continue;
        };
        let values = returns
            .get(series.asset())
            .map(|r| r.values())
            .unwrap_or_default();

        let daily_volatility = sample_std(&values);
        let mean_return = mean(&values);

        if values.len() < 2 {
            report.warnings.push(ComputationWarning::InsufficientHistory {
                asset: series.asset().clone(),
                observations: values.len(),
            });
        } else if sample_variance(&values).is_some_and(is_degenerate) {
            report.warnings.push(ComputationWarning::ConstantSeries {
                asset: series.asset().clone(),
            });
        }

        let excess_mean = mean_return.map(|m| m - rf);
        let sharpe = ratio(excess_mean, daily_volatility, scale);

        let losses: Vec<f64> = values.iter().copied().filter(|r| *r < 0.0).collect();
        let sortino = ratio(mean_return, sample_std(&losses), scale);

        report.metrics.push(SummaryMetrics {
            asset: series.asset().clone(),
            initial_price: first.value,
            final_price: last.value,
            total_return: last.value / first.value - 1.0,
            mean_return,
            daily_volatility,
            annual_volatility: daily_volatility.map(|v| v * scale),
            sharpe,
            sortino,
            value_at_risk: quantile(&values, VAR_LEVEL),
            max_return: values.iter().copied().reduce(f64::max),
            min_return: values.iter().copied().reduce(f64::min),
            max_drawdown: max_drawdown(&values),
            observations: values.len(),
        });
    }

    report
}

fn ratio(numerator: Option<f64>, deviation: Option<f64>, scale: f64) -> Option<f64> {
    let (num, dev) = (numerator?, deviation?);
    if is_degenerate(dev * dev) {
        return None;
    }
    Some(num / dev * scale)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use test_case::test_case;

    use super::*;
    use crate::domain::series::{PriceTableBuilder, compute_returns};

    fn prices(assets: &[(&str, &[f64])]) -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut builder = PriceTableBuilder::new();
        for (asset, values) in assets {
            for (i, price) in values.iter().enumerate() {
                builder.push(AssetId::new(asset), start + chrono::Days::new(i as u64), *price);
            }
        }
        builder.build()
    }

    fn summarize_one(values: &[f64]) -> SummaryReport {
        let table = prices(&[("X", values)]);
        summarize(&table, &compute_returns(&table), &AnalyticsParams::default())
    }

    #[test]
    fn basic_metrics() {
        let report = summarize_one(&[100.0, 110.0, 99.0, 108.9]);
        let m = &report.metrics[0];

        assert!((m.total_return - 0.089).abs() < 1e-9);
        assert_eq!(m.observations, 3);
        assert!((m.max_return.unwrap() - 0.1).abs() < 1e-9);
        assert!((m.min_return.unwrap() + 0.1).abs() < 1e-9);
        // equity 1.1 -> 0.99 -> 1.089; worst = 0.99 / 1.1 - 1
        assert!((m.max_drawdown.unwrap() + 0.1).abs() < 1e-9);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn annual_volatility_scales_daily() {
        let report = summarize_one(&[100.0, 102.0, 99.0, 101.0, 103.0]);
        let m = &report.metrics[0];
        let expected = m.daily_volatility.unwrap() * 252_f64.sqrt();
        assert!((m.annual_volatility.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn sharpe_matches_definition() {
        let report = summarize_one(&[100.0, 102.0, 99.0, 101.0, 103.0]);
        let m = &report.metrics[0];
        let expected = m.mean_return.unwrap() / m.daily_volatility.unwrap() * 252_f64.sqrt();
        assert!((m.sharpe.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn sortino_undefined_without_two_losing_days() {
        let report = summarize_one(&[100.0, 101.0, 100.5, 102.0]);
        assert!(report.metrics[0].sortino.is_none());
        assert!(report.metrics[0].sharpe.is_some());
    }

    #[test]
    fn single_return_warns_insufficient_history() {
        let report = summarize_one(&[100.0, 105.0]);
        let m = &report.metrics[0];
        assert!(m.daily_volatility.is_none());
        assert!(m.sharpe.is_none());
        assert_eq!(
            report.warnings,
            vec![ComputationWarning::InsufficientHistory {
                asset: AssetId::new("X"),
                observations: 1,
            }]
        );
    }

    #[test]
    fn flat_prices_warn_constant_series() {
        let report = summarize_one(&[100.0, 100.0, 100.0, 100.0]);
        assert!(report.metrics[0].sharpe.is_none());
        assert!(matches!(
            report.warnings.as_slice(),
            [ComputationWarning::ConstantSeries { .. }]
        ));
    }

    #[test]
    fn risk_free_rate_lowers_sharpe() {
        let table = prices(&[("X", &[100.0, 102.0, 99.0, 101.0, 103.0])]);
        let returns = compute_returns(&table);
        let base = summarize(&table, &returns, &AnalyticsParams::default());
        let with_rf = summarize(
            &table,
            &returns,
            &AnalyticsParams {
                risk_free_rate: 0.05,
                ..AnalyticsParams::default()
            },
        );
        assert!(with_rf.metrics[0].sharpe.unwrap() < base.metrics[0].sharpe.unwrap());
        assert_eq!(with_rf.metrics[0].sortino, base.metrics[0].sortino);
    }

    #[test]
    fn sortino_uses_raw_mean_over_downside_deviation() {
        let table = prices(&[("X", &[100.0, 97.0, 101.0, 99.0, 104.0, 102.0])]);
        let returns = compute_returns(&table);
        let report = summarize(
            &table,
            &returns,
            &AnalyticsParams {
                risk_free_rate: 0.04,
                ..AnalyticsParams::default()
            },
        );

        let values = returns.get(&AssetId::new("X")).unwrap().values();
        let losses: Vec<f64> = values.iter().copied().filter(|r| *r < 0.0).collect();
        let expected =
            mean(&values).unwrap() / sample_std(&losses).unwrap() * 252_f64.sqrt();
        assert!((report.metrics[0].sortino.unwrap() - expected).abs() < 1e-12);
    }

    #[test_case("total_return", Some(MetricColumn::TotalReturn))]
    #[test_case("VAR_5", Some(MetricColumn::ValueAtRisk))]
    #[test_case("sharpe", Some(MetricColumn::Sharpe))]
    #[test_case("alpha", None)]
    fn column_parsing(input: &str, expected: Option<MetricColumn>) {
        assert_eq!(MetricColumn::parse(input), expected);
    }

    #[test]
    fn column_keys_round_trip_through_serde() {
        for column in MetricColumn::ALL {
            let json = serde_json::to_string(&column).unwrap();
            assert_eq!(json, format!("\"{}\"", column.key()));
        }
    }
}
