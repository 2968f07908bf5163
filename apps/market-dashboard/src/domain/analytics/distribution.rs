//! Shape of one asset's return distribution.

use serde::Serialize;

use super::math::{excess_kurtosis, mean, sample_std, skewness};
use crate::domain::series::{AssetId, ReturnSeries};

/// One histogram bucket `[lower, upper)`; the last bucket is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Lower edge.
    pub lower: f64,
    /// Upper edge.
    pub upper: f64,
    /// Returns falling in the bucket.
    pub count: usize,
}

/// Qualitative reading of skewness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkewShape {
    /// |skew| below 0.5.
    Symmetric,
    /// Long right tail.
    PositiveSkew,
    /// Long left tail.
    NegativeSkew,
}

impl SkewShape {
    /// Classify a skewness value.
    #[must_use]
    pub fn from_skewness(skew: f64) -> Self {
        if skew.abs() < 0.5 {
            Self::Symmetric
        } else if skew > 0.0 {
            Self::PositiveSkew
        } else {
            Self::NegativeSkew
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Symmetric => "Symmetric",
            Self::PositiveSkew => "Positive skew",
            Self::NegativeSkew => "Negative skew",
        }
    }
}

/// Qualitative reading of excess kurtosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TailShape {
    /// |kurtosis| below 1.
    Normal,
    /// Fatter tails than a normal distribution.
    HeavyTails,
    /// Thinner tails than a normal distribution.
    LightTails,
}

impl TailShape {
    /// Classify an excess kurtosis value.
    #[must_use]
    pub fn from_kurtosis(kurtosis: f64) -> Self {
        if kurtosis.abs() < 1.0 {
            Self::Normal
        } else if kurtosis > 1.0 {
            Self::HeavyTails
        } else {
            Self::LightTails
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::HeavyTails => "Heavy tails",
            Self::LightTails => "Light tails",
        }
    }
}

/// Distribution statistics of one asset's returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionStats {
    /// Asset identifier.
    pub asset: AssetId,
    /// Number of returns.
    pub observations: usize,
    /// Mean return.
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std_dev: Option<f64>,
    /// Bias-corrected skewness.
    pub skewness: Option<f64>,
    /// Bias-corrected excess kurtosis.
    pub excess_kurtosis: Option<f64>,
    /// Equal-width histogram over the observed range.
    pub histogram: Vec<HistogramBin>,
}

impl DistributionStats {
    /// Skewness classification, if skewness is defined.
    #[must_use]
    pub fn skew_shape(&self) -> Option<SkewShape> {
        self.skewness.map(SkewShape::from_skewness)
    }

    /// Tail classification, if kurtosis is defined.
    #[must_use]
    pub fn tail_shape(&self) -> Option<TailShape> {
        self.excess_kurtosis.map(TailShape::from_kurtosis)
    }
}

/// Describe the distribution of `returns` with a `bins`-bucket histogram.
///
/// All returns equal collapses the histogram into a single bucket.
#[must_use]
pub fn describe_distribution(returns: &ReturnSeries, bins: usize) -> DistributionStats {
    let values = returns.values();
    DistributionStats {
        asset: returns.asset().clone(),
        observations: values.len(),
        mean: mean(&values),
        std_dev: sample_std(&values),
        skewness: skewness(&values),
        excess_kurtosis: excess_kurtosis(&values),
        histogram: histogram(&values, bins),
    }
}

fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (Some(lo), Some(hi)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }
    if hi <= lo {
        return vec![HistogramBin {
            lower: lo,
            upper: hi,
            count: values.len(),
        }];
    }

    let width = (hi - lo) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use test_case::test_case;

    use super::*;
    use crate::domain::series::{PriceTableBuilder, compute_returns};

    fn returns_of(prices: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut builder = PriceTableBuilder::new();
        for (i, price) in prices.iter().enumerate() {
            builder.push(AssetId::new("X"), start + chrono::Days::new(i as u64), *price);
        }
        compute_returns(&builder.build())
            .get(&AssetId::new("X"))
            .unwrap()
            .clone()
    }

    #[test]
    fn histogram_counts_every_return() {
        let returns = returns_of(&[100.0, 101.0, 99.0, 103.0, 102.0, 104.0, 100.0]);
        let stats = describe_distribution(&returns, 4);

        assert_eq!(stats.histogram.len(), 4);
        let total: usize = stats.histogram.iter().map(|b| b.count).sum();
        assert_eq!(total, stats.observations);
        assert_eq!(stats.observations, 6);
    }

    #[test]
    fn histogram_edges_are_contiguous() {
        let returns = returns_of(&[100.0, 101.0, 99.0, 103.0, 102.0]);
        let stats = describe_distribution(&returns, 5);
        for pair in stats.histogram.windows(2) {
            assert!((pair[0].upper - pair[1].lower).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_returns_use_one_bucket() {
        let returns = returns_of(&[100.0, 100.0, 100.0]);
        let stats = describe_distribution(&returns, 50);
        assert_eq!(stats.histogram.len(), 1);
        assert_eq!(stats.histogram[0].count, 2);
        assert!(stats.skewness.is_none());
    }

    #[test]
    fn empty_series_has_no_histogram() {
        let stats = describe_distribution(&returns_of(&[100.0]), 50);
        assert!(stats.histogram.is_empty());
        assert!(stats.mean.is_none());
        assert!(stats.skew_shape().is_none());
    }

    #[test_case(0.2, SkewShape::Symmetric)]
    #[test_case(0.9, SkewShape::PositiveSkew)]
    #[test_case(-1.4, SkewShape::NegativeSkew)]
    fn skew_labels(skew: f64, expected: SkewShape) {
        assert_eq!(SkewShape::from_skewness(skew), expected);
    }

    #[test_case(0.5, TailShape::Normal)]
    #[test_case(3.0, TailShape::HeavyTails)]
    #[test_case(-1.5, TailShape::LightTails)]
    fn tail_labels(kurtosis: f64, expected: TailShape) {
        assert_eq!(TailShape::from_kurtosis(kurtosis), expected);
    }
}
