//! Pairwise Pearson correlation of returns.

use serde::Serialize;

use super::math::{is_degenerate, pearson, sample_variance};
use crate::domain::errors::ComputationWarning;
use crate::domain::series::{AssetId, ReturnSeries, ReturnTable};

/// Square symmetric correlation table indexed by asset.
///
/// `values[i][j]` is the correlation of `assets[i]` with `assets[j]`, or
/// `None` when it is undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    assets: Vec<AssetId>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Row and column labels.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Matrix rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Option<f64>>] {
        &self.values
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the matrix is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Correlation of two assets, `None` if unknown or undefined.
    #[must_use]
    pub fn get(&self, a: &AssetId, b: &AssetId) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.values[i][j]
    }

    fn index_of(&self, asset: &AssetId) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }
}

/// Correlation matrix plus the warnings for undefined cells.
#[derive(Debug, Clone, Default)]
pub struct CorrelationReport {
    /// The matrix.
    pub matrix: CorrelationMatrix,
    /// One warning per undefined cell (per pair off the diagonal).
    pub warnings: Vec<ComputationWarning>,
}

/// A correlated pair of distinct assets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    /// First asset.
    pub first: AssetId,
    /// Second asset.
    pub second: AssetId,
    /// Correlation coefficient.
    pub correlation: f64,
}

/// Most and least correlated pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedPairs {
    /// Highest correlations, descending.
    pub most: Vec<CorrelatedPair>,
    /// Lowest correlations, ascending.
    pub least: Vec<CorrelatedPair>,
}

/// Compute the correlation matrix of every asset in `returns`.
///
/// Each pair is correlated over the dates both assets have returns for. A
/// cell is `None` when fewer than two dates overlap or when either side is
/// constant over the overlap. The diagonal is 1.0 for every asset with at
/// least two returns and non-zero variance.
#[must_use]
pub fn compute_correlation(returns: &ReturnTable) -> CorrelationReport {
    let series: Vec<&ReturnSeries> = returns.iter().collect();
    let n = series.len();
    let mut values = vec![vec![None; n]; n];
    let mut warnings = Vec::new();

    for (i, s) in series.iter().enumerate() {
        let own = s.values();
        values[i][i] = match sample_variance(&own) {
            None => {
                warnings.push(ComputationWarning::InsufficientHistory {
                    asset: s.asset().clone(),
                    observations: own.len(),
                });
                None
            }
            Some(var) if is_degenerate(var) => {
                warnings.push(ComputationWarning::ConstantSeries {
                    asset: s.asset().clone(),
                });
                None
            }
            Some(_) => Some(1.0),
        };
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (xs, ys) = overlap(series[i], series[j]);
            let cell = if xs.len() < 2 {
                warnings.push(ComputationWarning::InsufficientOverlap {
                    first: series[i].asset().clone(),
                    second: series[j].asset().clone(),
                    observations: xs.len(),
                });
                None
            } else {
                let r = pearson(&xs, &ys);
                if r.is_none() {
                    warnings.push(ComputationWarning::ZeroVariance {
                        first: series[i].asset().clone(),
                        second: series[j].asset().clone(),
                    });
                }
                r
            };
            values[i][j] = cell;
            values[j][i] = cell;
        }
    }

    CorrelationReport {
        matrix: CorrelationMatrix {
            assets: series.iter().map(|s| s.asset().clone()).collect(),
            values,
        },
        warnings,
    }
}

/// Return values of both series on their shared dates.
fn overlap(a: &ReturnSeries, b: &ReturnSeries) -> (Vec<f64>, Vec<f64>) {
    let (pa, pb) = (a.points(), b.points());
    let (mut i, mut j) = (0, 0);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    while i < pa.len() && j < pb.len() {
        match pa[i].date.cmp(&pb[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                xs.push(pa[i].value);
                ys.push(pb[j].value);
                i += 1;
                j += 1;
            }
        }
    }
    (xs, ys)
}

/// The `n` most and `n` least correlated distinct pairs.
#[must_use]
pub fn ranked_pairs(matrix: &CorrelationMatrix, n: usize) -> RankedPairs {
    let mut pairs = Vec::new();
    for (i, row) in matrix.values.iter().enumerate() {
        for (j, cell) in row.iter().enumerate().skip(i + 1) {
            if let Some(correlation) = cell {
                pairs.push(CorrelatedPair {
                    first: matrix.assets[i].clone(),
                    second: matrix.assets[j].clone(),
                    correlation: *correlation,
                });
            }
        }
    }

    pairs.sort_by(|a, b| b.correlation.total_cmp(&a.correlation));
    let most = pairs.iter().take(n).cloned().collect();
    let least = pairs.iter().rev().take(n).cloned().collect();
    RankedPairs { most, least }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::series::{PriceTableBuilder, compute_returns};

    fn returns_from(assets: &[(&str, u64, &[f64])]) -> ReturnTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut builder = PriceTableBuilder::new();
        for (asset, offset, prices) in assets {
            for (i, price) in prices.iter().enumerate() {
                builder.push(
                    AssetId::new(asset),
                    start + chrono::Days::new(offset + i as u64),
                    *price,
                );
            }
        }
        compute_returns(&builder.build())
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let returns = returns_from(&[
            ("A", 0, &[100.0, 101.0, 99.0, 102.0, 103.0]),
            ("B", 0, &[50.0, 50.5, 49.0, 51.0, 50.0]),
            ("C", 0, &[10.0, 9.0, 9.5, 9.2, 9.9]),
        ]);
        let report = compute_correlation(&returns);
        let m = &report.matrix;

        for i in 0..m.len() {
            assert_eq!(m.rows()[i][i], Some(1.0));
            for j in 0..m.len() {
                assert_eq!(m.rows()[i][j], m.rows()[j][i]);
                if let Some(v) = m.rows()[i][j] {
                    assert!((-1.0..=1.0).contains(&v));
                }
            }
        }
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn identical_moves_correlate_perfectly() {
        let returns = returns_from(&[
            ("A", 0, &[100.0, 110.0, 99.0, 105.0]),
            ("B", 0, &[10.0, 11.0, 9.9, 10.5]),
        ]);
        let report = compute_correlation(&returns);
        let r = report.matrix.get(&AssetId::new("A"), &AssetId::new("B")).unwrap();
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_overlap_is_missing_with_one_warning() {
        // A returns on days 1..=4, B returns on days 4..=6.
        let returns = returns_from(&[
            ("A", 0, &[100.0, 101.0, 99.0, 102.0, 103.0]),
            ("B", 3, &[50.0, 51.0, 49.0, 52.0]),
        ]);
        let report = compute_correlation(&returns);

        assert_eq!(
            report.matrix.get(&AssetId::new("A"), &AssetId::new("B")),
            None
        );
        assert_eq!(
            report.warnings,
            vec![ComputationWarning::InsufficientOverlap {
                first: AssetId::new("A"),
                second: AssetId::new("B"),
                observations: 1,
            }]
        );
    }

    #[test]
    fn constant_asset_has_missing_diagonal() {
        let returns = returns_from(&[
            ("A", 0, &[100.0, 101.0, 99.0, 102.0]),
            ("FLAT", 0, &[10.0, 10.0, 10.0, 10.0]),
        ]);
        let report = compute_correlation(&returns);
        let flat = AssetId::new("FLAT");

        assert_eq!(report.matrix.get(&flat, &flat), None);
        assert_eq!(report.matrix.get(&AssetId::new("A"), &flat), None);
        assert!(report.warnings.contains(&ComputationWarning::ConstantSeries {
            asset: flat.clone()
        }));
        assert!(report.warnings.contains(&ComputationWarning::ZeroVariance {
            first: AssetId::new("A"),
            second: flat,
        }));
    }

    #[test]
    fn ranking_orders_pairs() {
        let returns = returns_from(&[
            ("A", 0, &[100.0, 110.0, 99.0, 105.0, 104.0]),
            ("B", 0, &[10.0, 11.0, 9.9, 10.5, 10.4]),
            ("C", 0, &[10.0, 9.0, 10.0, 9.5, 9.6]),
        ]);
        let report = compute_correlation(&returns);
        let ranked = ranked_pairs(&report.matrix, 1);

        assert_eq!(ranked.most.len(), 1);
        assert_eq!(ranked.most[0].first, AssetId::new("A"));
        assert_eq!(ranked.most[0].second, AssetId::new("B"));
        assert!(ranked.least[0].correlation <= ranked.most[0].correlation);
    }

    #[test]
    fn empty_table_gives_empty_matrix() {
        let report = compute_correlation(&ReturnTable::default());
        assert!(report.matrix.is_empty());
        assert!(ranked_pairs(&report.matrix, 3).most.is_empty());
    }
}
