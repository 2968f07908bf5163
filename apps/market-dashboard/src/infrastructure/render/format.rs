//! Formatting utilities for metric display.

use crate::domain::analytics::{ColumnKind, MetricColumn};

/// Format a fraction as a percentage string.
#[must_use]
pub fn format_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v * 100.0))
}

/// Format an optional ratio with 2 decimal places.
#[must_use]
pub fn format_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

/// Format a price level.
#[must_use]
pub fn format_price(value: f64) -> String {
    format!("{value:.2}")
}

/// Format the value of a metrics table cell.
#[must_use]
pub fn format_metric(column: MetricColumn, value: Option<f64>) -> String {
    match column.kind() {
        ColumnKind::Percent => format_pct(value),
        ColumnKind::Ratio => format_ratio(value),
        ColumnKind::Price => value.map_or_else(|| "N/A".to_string(), format_price),
        ColumnKind::Count => value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.0}")),
    }
}

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_pct(Some(0.1523)), "15.23%");
        assert_eq!(format_pct(None), "N/A");
        assert_eq!(format_ratio(Some(2.5)), "2.50");
        assert_eq!(format_price(123.4), "123.40");
    }

    #[test]
    fn test_format_by_column() {
        assert_eq!(format_metric(MetricColumn::TotalReturn, Some(-0.05)), "-5.00%");
        assert_eq!(format_metric(MetricColumn::Sharpe, Some(1.0)), "1.00");
        assert_eq!(format_metric(MetricColumn::Observations, Some(250.0)), "250");
        assert_eq!(format_metric(MetricColumn::FinalPrice, None), "N/A");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">AT&T's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;AT&amp;T&#39;s&lt;/a&gt;"
        );
    }
}
