//! Statistical helpers shared by the analytics modules.
//!
//! Inputs are expected to be finite. Functions that need a minimum sample
//! size return `None` below it.

use super::constants::VARIANCE_EPSILON;

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator).
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg) * (v - avg)).sum();
    Some(sum_sq / (values.len() - 1) as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Whether a variance should be treated as zero.
pub fn is_degenerate(variance: f64) -> bool {
    variance <= VARIANCE_EPSILON
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q = q.clamp(0.0, 1.0);
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Median (50% quantile).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Pearson correlation of two equally long samples.
///
/// Returns `None` for fewer than two pairs or when either side has zero
/// variance. The result is clamped to `[-1, 1]`.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let n1 = (xs.len() - 1) as f64;
    if is_degenerate(sxx / n1) || is_degenerate(syy / n1) {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Central moments m2, m3, m4 with an n denominator.
fn central_moments(values: &[f64]) -> Option<(f64, f64, f64)> {
    let avg = mean(values)?;
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - avg;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    Some((m2 / n, m3 / n, m4 / n))
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson, G1).
///
/// Needs at least three values and non-zero variance.
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values)?;
    if is_degenerate(m2) {
        return None;
    }
    let n = values.len() as f64;
    let g1 = m3 / m2.powf(1.5);
    Some((n * (n - 1.0)).sqrt() / (n - 2.0) * g1)
}

/// Bias-corrected sample excess kurtosis (G2).
///
/// Needs at least four values and non-zero variance.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    if values.len() < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values)?;
    if is_degenerate(m2) {
        return None;
    }
    let n = values.len() as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some((n - 1.0) / ((n - 2.0) * (n - 3.0)) * ((n + 1.0) * g2 + 6.0))
}

/// Deepest peak-to-trough decline of the compounded return curve, as a
/// non-positive fraction.
///
/// The running peak starts at the first compounded value.
pub fn max_drawdown(returns: &[f64]) -> Option<f64> {
    let mut equity = 1.0_f64;
    let mut peak = f64::NEG_INFINITY;
    let mut worst: Option<f64> = None;
    for r in returns {
        equity *= 1.0 + r;
        peak = peak.max(equity);
        let dd = equity / peak - 1.0;
        worst = Some(worst.map_or(dd, |w: f64| w.min(dd)));
    }
    worst
}
