//! Constants for analytics calculations.

/// Trading days per year used for annualization.
pub const TRADING_DAYS: u32 = 252;

/// Default number of histogram bins for the return distribution.
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// Tail probability of the historical Value at Risk.
pub const VAR_LEVEL: f64 = 0.05;

/// Variances at or below this are treated as zero.
pub const VARIANCE_EPSILON: f64 = 1e-20;

/// Number of pairs listed in each correlation ranking.
pub const DEFAULT_RANKED_PAIRS: usize = 3;
