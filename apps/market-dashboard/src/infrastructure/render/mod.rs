//! HTML and SVG rendering of dashboard views.

mod charts;
mod format;
mod page;

pub use charts::{correlation_heatmap, price_chart, return_histogram, risk_return_scatter, series_color};
pub use format::{escape_html, format_metric, format_pct, format_price, format_ratio};
pub use page::{PageContext, render_page};
