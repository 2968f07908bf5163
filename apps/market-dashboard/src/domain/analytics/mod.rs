//! Descriptive analytics over price and return tables.
//!
//! Implements the metrics behind each dashboard panel:
//! - Summary metrics (return, volatility, Sharpe, Sortino, VaR, drawdown)
//! - Pairwise return correlation and the most/least correlated pairs
//! - Return distribution shape (histogram, skewness, kurtosis)
//! - Risk/return quadrants and headline highlights

mod constants;
mod correlation;
mod distribution;
mod math;
mod screening;
mod summary;

pub use constants::{DEFAULT_HISTOGRAM_BINS, DEFAULT_RANKED_PAIRS, TRADING_DAYS};
pub use correlation::{
    CorrelatedPair, CorrelationMatrix, CorrelationReport, RankedPairs, compute_correlation,
    ranked_pairs,
};
pub use distribution::{
    DistributionStats, HistogramBin, SkewShape, TailShape, describe_distribution,
};
pub use screening::{Highlights, Quadrants, Standout, classify_quadrants, highlights};
pub use summary::{
    AnalyticsParams, ColumnKind, MetricColumn, SummaryMetrics, SummaryReport, summarize,
};
