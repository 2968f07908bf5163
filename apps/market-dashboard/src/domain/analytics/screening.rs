//! Cross-asset screens built on top of the summary metrics.

use serde::Serialize;

use super::math::median;
use super::summary::SummaryMetrics;
use crate::domain::series::AssetId;

/// Assets split by where they sit against the median risk and return.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Quadrants {
    /// Median total return of the classified assets.
    pub median_return: Option<f64>,
    /// Median annual volatility of the classified assets.
    pub median_volatility: Option<f64>,
    /// Above-median return with below-median volatility.
    pub ideal: Vec<AssetId>,
    /// Below-median return with above-median volatility.
    pub avoid: Vec<AssetId>,
}

/// Split assets into risk/return quadrants.
///
/// Assets without an annual volatility are left out of both the medians and
/// the lists.
#[must_use]
pub fn classify_quadrants(metrics: &[SummaryMetrics]) -> Quadrants {
    let points: Vec<(&AssetId, f64, f64)> = metrics
        .iter()
        .filter_map(|m| m.annual_volatility.map(|vol| (&m.asset, m.total_return, vol)))
        .collect();

    let returns: Vec<f64> = points.iter().map(|p| p.1).collect();
    let vols: Vec<f64> = points.iter().map(|p| p.2).collect();
    let (Some(median_return), Some(median_volatility)) = (median(&returns), median(&vols)) else {
        return Quadrants::default();
    };

    let ideal = points
        .iter()
        .filter(|(_, ret, vol)| *ret > median_return && *vol < median_volatility)
        .map(|(asset, _, _)| (*asset).clone())
        .collect();
    let avoid = points
        .iter()
        .filter(|(_, ret, vol)| *ret < median_return && *vol > median_volatility)
        .map(|(asset, _, _)| (*asset).clone())
        .collect();

    Quadrants {
        median_return: Some(median_return),
        median_volatility: Some(median_volatility),
        ideal,
        avoid,
    }
}

/// An asset paired with the value it was picked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standout {
    /// Asset identifier.
    pub asset: AssetId,
    /// Metric value.
    pub value: f64,
}

/// Headline numbers shown above the panels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    /// Assets analysed.
    pub asset_count: usize,
    /// Distinct dates in the window.
    pub days_analysed: usize,
    /// Highest total return.
    pub best_performer: Option<Standout>,
    /// Lowest total return.
    pub worst_performer: Option<Standout>,
    /// Highest Sharpe ratio.
    pub best_sharpe: Option<Standout>,
}

/// Pick the headline assets. `days_analysed` is passed through unchanged.
#[must_use]
pub fn highlights(metrics: &[SummaryMetrics], days_analysed: usize) -> Highlights {
    let by_return = |m: &SummaryMetrics| Standout {
        asset: m.asset.clone(),
        value: m.total_return,
    };

    Highlights {
        asset_count: metrics.len(),
        days_analysed,
        best_performer: metrics
            .iter()
            .max_by(|a, b| a.total_return.total_cmp(&b.total_return))
            .map(by_return),
        worst_performer: metrics
            .iter()
            .min_by(|a, b| a.total_return.total_cmp(&b.total_return))
            .map(by_return),
        best_sharpe: metrics
            .iter()
            .filter_map(|m| m.sharpe.map(|s| (m, s)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, s)| Standout {
                asset: m.asset.clone(),
                value: s,
            }),
    }
}
