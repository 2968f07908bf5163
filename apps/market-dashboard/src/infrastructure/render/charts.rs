//! Inline SVG charts.
//!
//! Each chart function returns a self-contained `<div class="plot">` with an
//! SVG body, or an empty string when there is nothing to draw. Hovering a
//! point shows its exact value through SVG `<title>` elements.

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDate};

use super::format::{escape_html, format_pct, format_ratio};
use crate::domain::analytics::{CorrelationMatrix, DistributionStats, Quadrants, SummaryMetrics};
use crate::domain::series::PriceTable;

const WIDTH: f64 = 760.0;
const HEIGHT: f64 = 340.0;
const PADDING: f64 = 44.0;
const ACCENT_COLOR: &str = "#8c8c8c";
const PALETTE: [&str; 10] = [
    "#348dc1", "#ff9933", "#4fa487", "#af4b64", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Color of the `idx`-th series.
#[must_use]
pub fn series_color(idx: usize) -> &'static str {
    PALETTE[idx % PALETTE.len()]
}

fn svg_header() -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}"><style>text{{font-family:Arial,sans-serif;font-size:10px;fill:#666}}</style>"#
    )
}

fn wrap_plot(title: &str, svg_body: &str) -> String {
    format!(
        r#"<div class="plot"><div class="plot-title">{}</div>{svg_body}</svg></div>"#,
        escape_html(title)
    )
}

/// Finite min and max of `values`, widened when flat.
fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.into_iter().filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if !min_v.is_finite() || !max_v.is_finite() {
        return None;
    }
    if (max_v - min_v).abs() < f64::EPSILON {
        let adjust = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= adjust;
        max_v += adjust;
    }
    Some((min_v, max_v))
}

/// Vertical pixel position of `value` on a `[min_v, max_v]` axis.
fn scale_y(value: f64, (min_v, max_v): (f64, f64)) -> f64 {
    let inner = HEIGHT - 2.0 * PADDING;
    PADDING + (1.0 - (value - min_v) / (max_v - min_v)) * inner
}

/// Horizontal pixel position of `value` on a `[min_v, max_v]` axis.
fn scale_x(value: f64, (min_v, max_v): (f64, f64)) -> f64 {
    let inner = WIDTH - 2.0 * PADDING;
    PADDING + (value - min_v) / (max_v - min_v) * inner
}

fn x_positions(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![WIDTH / 2.0],
        _ => {
            let inner = WIDTH - 2.0 * PADDING;
            (0..len)
                .map(|i| PADDING + inner * (i as f64 / (len - 1) as f64))
                .collect()
        }
    }
}

fn horizontal_guide(svg: &mut String, y: f64, label: &str) {
    let _ = write!(
        svg,
        r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{ACCENT_COLOR}" stroke-width="1" stroke-dasharray="4 3" /><text x="{x2:.2}" y="{ty:.2}" text-anchor="end" font-size="9">{label}</text>"#,
        x1 = PADDING,
        x2 = WIDTH - PADDING,
        ty = y - 4.0,
        label = escape_html(label),
    );
}

fn vertical_guide(svg: &mut String, x: f64, label: &str) {
    let _ = write!(
        svg,
        r#"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="{ACCENT_COLOR}" stroke-width="1" stroke-dasharray="4 3" /><text x="{tx:.2}" y="{ty:.2}" text-anchor="start" font-size="9">{label}</text>"#,
        y1 = PADDING,
        y2 = HEIGHT - PADDING,
        tx = x + 4.0,
        ty = PADDING + 10.0,
        label = escape_html(label),
    );
}

fn y_axis_labels(svg: &mut String, range: (f64, f64), fmt: impl Fn(f64) -> String) {
    for step in 0..=4 {
        let value = range.0 + (range.1 - range.0) * f64::from(step) / 4.0;
        let y = scale_y(value, range);
        let _ = write!(
            svg,
            r##"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="#eeeeee" stroke-width="0.5" /><text x="{tx:.2}" y="{ty:.2}" text-anchor="end">{label}</text>"##,
            x1 = PADDING,
            x2 = WIDTH - PADDING,
            tx = PADDING - 4.0,
            ty = y + 3.0,
            label = fmt(value),
        );
    }
}

fn time_axis(svg: &mut String, dates: &[NaiveDate], xs: &[f64]) {
    let axis_y = HEIGHT - PADDING + 5.0;
    let _ = write!(
        svg,
        r##"<line x1="{x1:.2}" y1="{axis_y:.2}" x2="{x2:.2}" y2="{axis_y:.2}" stroke="#000" stroke-width="1" />"##,
        x1 = PADDING,
        x2 = WIDTH - PADDING,
    );

    // Label months, or years once there are too many months to fit.
    let months = dates
        .windows(2)
        .filter(|w| (w[0].year(), w[0].month()) != (w[1].year(), w[1].month()))
        .count()
        + 1;
    let yearly = months > 14;

    let mut last_key: Option<(i32, u32)> = None;
    for (date, x) in dates.iter().zip(xs) {
        let key = if yearly {
            (date.year(), 0)
        } else {
            (date.year(), date.month())
        };
        if last_key == Some(key) {
            continue;
        }
        last_key = Some(key);
        let label = if yearly {
            date.format("%Y").to_string()
        } else {
            date.format("%Y-%m").to_string()
        };
        let _ = write!(
            svg,
            r##"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="#dddddd" stroke-width="0.5" /><text x="{x:.2}" y="{ty:.2}" text-anchor="middle">{label}</text>"##,
            y1 = PADDING,
            y2 = HEIGHT - PADDING,
            ty = axis_y + 16.0,
        );
    }
}

fn legend(svg: &mut String, labels: &[(String, &str)]) {
    let x = PADDING + 10.0;
    let mut y = PADDING + 12.0;
    for (label, color) in labels {
        let _ = write!(
            svg,
            r##"<line x1="{x:.2}" y1="{ly:.2}" x2="{x2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="2" /><text x="{tx:.2}" y="{y:.2}" text-anchor="start" fill="#333">{label}</text>"##,
            ly = y - 4.0,
            x2 = x + 20.0,
            tx = x + 26.0,
            label = escape_html(label),
        );
        y += 14.0;
    }
}

// =============================================================================
// Price Chart
// =============================================================================

/// Multi-line chart of rebased prices with a guide at 100.
#[must_use]
pub fn price_chart(normalized: &PriceTable) -> String {
    if normalized.observation_count() == 0 {
        return String::new();
    }
    let dates = normalized.dates();
    let Some(range) = extent(
        normalized
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.value))
            .chain(std::iter::once(100.0)),
    ) else {
        return String::new();
    };
    let xs = x_positions(dates.len());

    let mut svg = svg_header();
    y_axis_labels(&mut svg, range, |v| format!("{v:.0}"));
    horizontal_guide(&mut svg, scale_y(100.0, range), "100");

    let mut labels = Vec::new();
    for (idx, series) in normalized.iter().enumerate() {
        let color = series_color(idx);
        let coords: Vec<String> = series
            .points()
            .iter()
            .filter_map(|p| {
                let pos = dates.binary_search(&p.date).ok()?;
                Some(format!("{:.2},{:.2}", xs[pos], scale_y(p.value, range)))
            })
            .collect();
        if coords.is_empty() {
            continue;
        }
        let last = series.last().map_or(100.0, |p| p.value);
        let _ = write!(
            svg,
            r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{points}"><title>{asset}: {last:.1}</title></polyline>"#,
            points = coords.join(" "),
            asset = escape_html(series.asset().as_str()),
        );
        labels.push((series.asset().to_string(), color));
    }

    time_axis(&mut svg, &dates, &xs);
    legend(&mut svg, &labels);
    wrap_plot("Normalized Performance (Base 100)", &svg)
}

// =============================================================================
// Risk / Return Scatter
// =============================================================================

/// Blend from red (low) through yellow to green (high) for `t` in `[0, 1]`.
fn diverging_color(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    let (r, g, b) = if t < 0.5 {
        let u = t * 2.0;
        (215.0 + (254.0 - 215.0) * u, 48.0 + (224.0 - 48.0) * u, 39.0 + (139.0 - 39.0) * u)
    } else {
        let u = (t - 0.5) * 2.0;
        (254.0 + (26.0 - 254.0) * u, 224.0 + (152.0 - 224.0) * u, 139.0 + (80.0 - 139.0) * u)
    };
    format!("rgb({r:.0},{g:.0},{b:.0})")
}

/// Scatter of annual volatility against total return, colored by Sharpe.
#[must_use]
pub fn risk_return_scatter(metrics: &[SummaryMetrics], quadrants: &Quadrants) -> String {
    let points: Vec<(&SummaryMetrics, f64)> = metrics
        .iter()
        .filter_map(|m| m.annual_volatility.map(|vol| (m, vol)))
        .collect();
    if points.is_empty() {
        return String::new();
    }
    let (Some(x_range), Some(y_range)) = (
        extent(points.iter().map(|(_, vol)| *vol).chain(std::iter::once(0.0))),
        extent(points.iter().map(|(m, _)| m.total_return).chain(std::iter::once(0.0))),
    ) else {
        return String::new();
    };
    let sharpe_range = extent(points.iter().filter_map(|(m, _)| m.sharpe));

    let mut svg = svg_header();
    y_axis_labels(&mut svg, y_range, |v| format_pct(Some(v)));
    horizontal_guide(&mut svg, scale_y(0.0, y_range), "0%");
    if let Some(median_vol) = quadrants.median_volatility {
        vertical_guide(
            &mut svg,
            scale_x(median_vol, x_range),
            &format!("median vol {}", format_pct(Some(median_vol))),
        );
    }

    for (m, vol) in &points {
        let x = scale_x(*vol, x_range);
        let y = scale_y(m.total_return, y_range);
        let color = match (m.sharpe, sharpe_range) {
            (Some(s), Some((lo, hi))) => diverging_color((s - lo) / (hi - lo)),
            _ => ACCENT_COLOR.to_string(),
        };
        let asset = escape_html(m.asset.as_str());
        let _ = write!(
            svg,
            r##"<circle cx="{x:.2}" cy="{y:.2}" r="6" fill="{color}" stroke="#333" stroke-width="0.5"><title>{asset}: return {ret}, volatility {vol}, Sharpe {sharpe}</title></circle><text x="{x:.2}" y="{ty:.2}" text-anchor="middle" fill="#333">{asset}</text>"##,
            ty = y - 9.0,
            ret = format_pct(Some(m.total_return)),
            vol = format_pct(Some(*vol)),
            sharpe = format_ratio(m.sharpe),
        );
    }

    let axis_y = HEIGHT - PADDING + 5.0;
    for step in 0..=4 {
        let value = x_range.0 + (x_range.1 - x_range.0) * f64::from(step) / 4.0;
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = scale_x(value, x_range),
            y = axis_y + 16.0,
            label = format_pct(Some(value)),
        );
    }

    wrap_plot("Risk vs Return (annual volatility, total return)", &svg)
}

// =============================================================================
// Correlation Heatmap
// =============================================================================

/// Blue for +1, white for 0, red for -1.
fn correlation_color(value: f64) -> String {
    let t = value.clamp(-1.0, 1.0).abs();
    let (br, bg, bb) = if value >= 0.0 {
        (52.0, 141.0, 193.0)
    } else {
        (175.0, 75.0, 100.0)
    };
    let r = 255.0 * (1.0 - t) + br * t;
    let g = 255.0 * (1.0 - t) + bg * t;
    let b = 255.0 * (1.0 - t) + bb * t;
    format!("rgb({r:.0},{g:.0},{b:.0})")
}

/// Square heatmap of a correlation matrix; undefined cells are grey.
#[must_use]
pub fn correlation_heatmap(matrix: &CorrelationMatrix) -> String {
    let n = matrix.len();
    if n == 0 {
        return String::new();
    }

    let left_pad = 70.0;
    let top_pad = 20.0;
    let bottom_pad = 50.0;
    let cell = ((HEIGHT - top_pad - bottom_pad) / n as f64).min((WIDTH - left_pad - 20.0) / n as f64);
    let assets = matrix.assets();

    let mut svg = svg_header();
    for (row, values) in matrix.rows().iter().enumerate() {
        let y = top_pad + row as f64 * cell;
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{ty:.2}" text-anchor="end">{label}</text>"#,
            x = left_pad - 5.0,
            ty = y + cell / 2.0 + 3.0,
            label = escape_html(assets[row].as_str()),
        );

        for (col, value) in values.iter().enumerate() {
            let x = left_pad + col as f64 * cell;
            let (fill, text) = value.map_or_else(
                || ("#f0f0f0".to_string(), "n/a".to_string()),
                |v| (correlation_color(v), format!("{v:.2}")),
            );
            let text_color = if value.is_some_and(|v| v.abs() > 0.6) {
                "#ffffff"
            } else {
                "#262626"
            };
            let _ = write!(
                svg,
                r##"<rect x="{x:.2}" y="{y:.2}" width="{cell:.2}" height="{cell:.2}" fill="{fill}" stroke="#ffffff"><title>{a} / {b}: {text}</title></rect>"##,
                a = escape_html(assets[row].as_str()),
                b = escape_html(assets[col].as_str()),
            );
            if cell >= 24.0 {
                let _ = write!(
                    svg,
                    r#"<text x="{tx:.2}" y="{ty:.2}" text-anchor="middle" font-size="9" style="fill:{text_color}">{text}</text>"#,
                    tx = x + cell / 2.0,
                    ty = y + cell / 2.0 + 3.0,
                );
            }
        }
    }

    for (col, asset) in assets.iter().enumerate() {
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = left_pad + (col as f64 + 0.5) * cell,
            y = top_pad + n as f64 * cell + 14.0,
            label = escape_html(asset.as_str()),
        );
    }

    wrap_plot("Correlation of Daily Returns", &svg)
}

// =============================================================================
// Return Histogram
// =============================================================================

/// Histogram of one asset's daily returns with its mean marked.
#[must_use]
pub fn return_histogram(stats: &DistributionStats) -> String {
    let bins = &stats.histogram;
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return String::new();
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let x_range = if last.upper > first.lower {
        (first.lower, last.upper)
    } else {
        (first.lower - 0.01, first.lower + 0.01)
    };
    let y_range = (0.0, max_count as f64);

    let mut svg = svg_header();
    y_axis_labels(&mut svg, y_range, |v| format!("{v:.0}"));

    let baseline = scale_y(0.0, y_range);
    for bin in bins {
        let (x0, x1) = if last.upper > first.lower {
            (scale_x(bin.lower, x_range), scale_x(bin.upper, x_range))
        } else {
            (WIDTH / 2.0 - 10.0, WIDTH / 2.0 + 10.0)
        };
        let top = scale_y(bin.count as f64, y_range);
        let _ = write!(
            svg,
            r##"<rect x="{x0:.2}" y="{top:.2}" width="{w:.2}" height="{h:.2}" fill="{color}" stroke="#ffffff" stroke-width="0.5"><title>{lo} to {hi}: {count}</title></rect>"##,
            w = (x1 - x0).max(1.0),
            h = baseline - top,
            color = PALETTE[0],
            lo = format_pct(Some(bin.lower)),
            hi = format_pct(Some(bin.upper)),
            count = bin.count,
        );
    }

    if let Some(mean) = stats.mean.filter(|m| (x_range.0..=x_range.1).contains(m)) {
        vertical_guide(
            &mut svg,
            scale_x(mean, x_range),
            &format!("mean {}", format_pct(Some(mean))),
        );
    }

    let axis_y = HEIGHT - PADDING + 5.0;
    for step in 0..=4 {
        let value = x_range.0 + (x_range.1 - x_range.0) * f64::from(step) / 4.0;
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            x = scale_x(value, x_range),
            y = axis_y + 16.0,
            label = format_pct(Some(value)),
        );
    }

    wrap_plot(
        &format!("Daily Return Distribution: {}", stats.asset),
        &svg,
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::analytics::{classify_quadrants, compute_correlation, describe_distribution, summarize, AnalyticsParams};
    use crate::domain::series::{AssetId, PriceTableBuilder, compute_returns, normalize_base100};

    fn table() -> PriceTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut builder = PriceTableBuilder::new();
        let data: [(&str, [f64; 5]); 2] = [
            ("A&B", [100.0, 101.0, 99.0, 102.0, 104.0]),
            ("MSFT", [300.0, 297.0, 305.0, 301.0, 310.0]),
        ];
        for (asset, prices) in data {
            for (i, price) in prices.into_iter().enumerate() {
                builder.push(AssetId::new(asset), start + chrono::Days::new(i as u64 * 20), price);
            }
        }
        builder.build()
    }

    #[test]
    fn price_chart_draws_one_line_per_asset() {
        let svg = price_chart(&normalize_base100(&table()));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("A&amp;B"));
        assert!(!svg.contains("A&B"));
    }

    #[test]
    fn empty_inputs_render_nothing() {
        assert!(price_chart(&PriceTable::new()).is_empty());
        assert!(risk_return_scatter(&[], &Quadrants::default()).is_empty());
        assert!(correlation_heatmap(&CorrelationMatrix::default()).is_empty());
    }

    #[test]
    fn scatter_without_volatility_renders_nothing() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let mut builder = PriceTableBuilder::new();
        builder.push(AssetId::new("ONE"), start, 10.0);
        builder.push(AssetId::new("ONE"), start + chrono::Days::new(1), 11.0);
        let prices = builder.build();
        let report = summarize(&prices, &compute_returns(&prices), &AnalyticsParams::default());
        assert!(report.metrics.iter().all(|m| m.annual_volatility.is_none()));
        assert!(risk_return_scatter(&report.metrics, &classify_quadrants(&report.metrics)).is_empty());
    }

    #[test]
    fn scatter_has_a_point_per_asset() {
        let prices = table();
        let report = summarize(&prices, &compute_returns(&prices), &AnalyticsParams::default());
        let svg = risk_return_scatter(&report.metrics, &classify_quadrants(&report.metrics));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("median vol"));
    }

    #[test]
    fn heatmap_has_square_grid() {
        let matrix = compute_correlation(&compute_returns(&table())).matrix;
        let svg = correlation_heatmap(&matrix);
        assert_eq!(svg.matches("<rect").count(), 4);
        assert!(svg.contains("1.00"));
    }

    #[test]
    fn histogram_has_a_bar_per_bin() {
        let returns = compute_returns(&table());
        let stats = describe_distribution(returns.get(&AssetId::new("MSFT")).unwrap(), 3);
        let svg = return_histogram(&stats);
        assert_eq!(svg.matches("<rect").count(), 3);
    }

    #[test]
    fn color_scales_hit_endpoints() {
        assert_eq!(correlation_color(0.0), "rgb(255,255,255)");
        assert_eq!(correlation_color(1.0), "rgb(52,141,193)");
        assert_eq!(diverging_color(0.0), "rgb(215,48,39)");
        assert_eq!(diverging_color(1.0), "rgb(26,152,80)");
    }
}
