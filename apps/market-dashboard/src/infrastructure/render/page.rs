//! Dashboard HTML page.
//!
//! The page is a single GET form: every control writes a query parameter and
//! resubmits, so the server stays stateless and each interaction is one
//! request.

use std::fmt::Write as _;

use super::charts::{correlation_heatmap, price_chart, return_histogram, risk_return_scatter};
use super::format::{escape_html, format_metric, format_pct, format_price, format_ratio};
use crate::application::{AssetGroup, DashboardView, Panel};
use crate::domain::analytics::{CorrelatedPair, MetricColumn, Standout};
use crate::domain::errors::RowWarning;
use crate::domain::series::AssetId;
use crate::domain::window::Preset;

const STYLE: &str = r"
body{font-family:Arial,sans-serif;margin:0;color:#262626;background:#fafafa}
header{padding:16px 24px;background:#1f2a36;color:#fff}
header h1{margin:0;font-size:20px}
header .meta{font-size:12px;color:#b8c2cc;margin-top:4px}
main{display:flex;gap:24px;padding:16px 24px}
aside{width:240px;flex-shrink:0;font-size:13px}
aside fieldset{border:1px solid #ddd;margin:0 0 12px;padding:8px;background:#fff}
aside select[multiple]{width:100%;min-height:120px}
section.content{flex:1;min-width:0}
.panel{background:#fff;border:1px solid #e3e3e3;padding:12px 16px;margin-bottom:16px}
.panel h2{font-size:15px;margin:0 0 8px}
.plot-title{font-size:12px;color:#666;margin-bottom:4px}
.highlights{display:flex;gap:12px;margin-bottom:16px}
.card{flex:1;background:#fff;border:1px solid #e3e3e3;padding:8px 12px}
.card .label{font-size:11px;color:#888}
.card .value{font-size:18px;font-weight:bold}
table{border-collapse:collapse;width:100%;font-size:13px}
th,td{padding:4px 8px;border-bottom:1px solid #eee;text-align:right}
th:first-child,td:first-child{text-align:left}
.warnings{background:#fff8e1;border:1px solid #f0d58c;padding:8px 12px;margin-bottom:16px;font-size:12px}
.columns label{display:inline-block;margin-right:10px;font-size:12px}
.pairs{display:flex;gap:24px;font-size:13px}
.muted{color:#888}
";

const SCRIPT: &str = r"
function setRange(mode){document.getElementById('range').value=mode;document.getElementById('controls').submit();}
function pickGroup(){for(const o of document.getElementById('assets').options){o.selected=false;}document.getElementById('controls').submit();}
function showLookback(v){document.getElementById('lookback-value').textContent=v+' days';}
";

/// Page-level context that does not depend on the query.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Where the prices were loaded from.
    pub source: &'a str,
    /// Configured asset groups.
    pub groups: &'a [AssetGroup],
    /// Rows skipped while loading.
    pub load_warnings: &'a [RowWarning],
    /// Raw query string of the request, reused by export links.
    pub query: &'a str,
}

/// Render the full dashboard page for `view`.
#[must_use]
pub fn render_page(view: &DashboardView, ctx: &PageContext<'_>) -> String {
    let mut html = String::with_capacity(64 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    html.push_str("<title>Market Dashboard</title><style>");
    html.push_str(STYLE);
    html.push_str("</style><script>");
    html.push_str(SCRIPT);
    html.push_str("</script></head><body>");

    header(&mut html, view, ctx);
    html.push_str("<form id=\"controls\" method=\"get\" action=\"/\"><main>");
    sidebar(&mut html, view, ctx);
    html.push_str("<section class=\"content\">");

    if view.is_empty() {
        html.push_str("<div class=\"panel\"><p>No price data in the selected range.</p></div>");
    } else {
        highlights_strip(&mut html, view);
    }
    warnings(&mut html, view, ctx.load_warnings);

    if !view.is_empty() {
        for panel in &view.panels {
            match panel {
                Panel::TimeRange => {}
                Panel::PriceChart => panel_box(&mut html, *panel, &price_chart(&view.normalized)),
                Panel::RiskReturn => risk_return_panel(&mut html, view),
                Panel::MetricsTable => metrics_panel(&mut html, view, ctx.query),
                Panel::Correlation => correlation_panel(&mut html, view),
                Panel::Distribution => distribution_panel(&mut html, view),
            }
        }
    }

    html.push_str("</section></main></form></body></html>");
    html
}

fn header(html: &mut String, view: &DashboardView, ctx: &PageContext<'_>) {
    let window = view
        .window
        .map_or_else(|| "no data".to_string(), |w| w.to_string());
    let _ = write!(
        html,
        "<header><h1>Market Dashboard</h1><div class=\"meta\">{} &middot; {} of {} assets &middot; {}</div></header>",
        escape_html(ctx.source),
        view.selected.len(),
        view.available.len(),
        escape_html(&window),
    );
}

fn panel_box(html: &mut String, panel: Panel, body: &str) {
    let _ = write!(
        html,
        "<div class=\"panel\" id=\"{}\"><h2>{}</h2>{}</div>",
        panel.key(),
        panel.title(),
        body
    );
}

// =============================================================================
// Controls
// =============================================================================

fn sidebar(html: &mut String, view: &DashboardView, ctx: &PageContext<'_>) {
    html.push_str("<aside>");

    html.push_str("<fieldset><legend>Assets</legend><select id=\"assets\" name=\"assets\" multiple>");
    for asset in &view.available {
        let selected = if view.group.is_none() && view.selected.contains(asset) {
            " selected"
        } else {
            ""
        };
        let name = escape_html(asset.as_str());
        let _ = write!(html, "<option value=\"{name}\"{selected}>{name}</option>");
    }
    html.push_str("</select>");

    if !ctx.groups.is_empty() {
        html.push_str("<p>Group <select name=\"group\" onchange=\"pickGroup()\"><option value=\"\">(none)</option>");
        for group in ctx.groups {
            let selected = if view.group.as_deref() == Some(group.name.as_str()) {
                " selected"
            } else {
                ""
            };
            let name = escape_html(&group.name);
            let _ = write!(html, "<option value=\"{name}\"{selected}>{name}</option>");
        }
        html.push_str("</select></p>");
    }
    html.push_str("<button type=\"submit\">Apply</button></fieldset>");

    if view.shows(Panel::TimeRange) {
        range_controls(html, view);
    }

    html.push_str("</aside>");
}

fn range_controls(html: &mut String, view: &DashboardView) {
    // Lookback windows are resubmitted as explicit dates.
    let mode = if view.preset.is_some() { "preset" } else { "custom" };
    let _ = write!(
        html,
        "<fieldset><legend>{}</legend><input type=\"hidden\" id=\"range\" name=\"range\" value=\"{mode}\">",
        Panel::TimeRange.title()
    );

    html.push_str("<p>Preset <select name=\"preset\" onchange=\"setRange('preset')\">");
    for preset in Preset::ALL {
        let selected = if view.preset == Some(preset) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            html,
            "<option value=\"{}\"{selected}>{}</option>",
            preset.as_str(),
            preset.label()
        );
    }
    html.push_str("</select></p>");

    if let Some(bounds) = view.bounds {
        let max_days = bounds.span_days() - 1;
        let current = view.lookback_days();
        let _ = write!(
            html,
            "<p>Lookback <span id=\"lookback-value\">{current} days</span><br>\
             <input type=\"range\" name=\"lookback_days\" min=\"1\" max=\"{max}\" value=\"{current}\" \
             oninput=\"showLookback(this.value)\" onchange=\"setRange('lookback')\" style=\"width:100%\"></p>",
            max = max_days.max(1),
        );

        let (from, to) = view.window.map_or((bounds.from, bounds.to), |w| (w.from, w.to));
        let _ = write!(
            html,
            "<p>From <input type=\"date\" name=\"from\" value=\"{from}\" min=\"{min}\" max=\"{max}\" onchange=\"setRange('custom')\"></p>\
             <p>To <input type=\"date\" name=\"to\" value=\"{to}\" min=\"{min}\" max=\"{max}\" onchange=\"setRange('custom')\"></p>",
            from = from.format("%Y-%m-%d"),
            to = to.format("%Y-%m-%d"),
            min = bounds.from.format("%Y-%m-%d"),
            max = bounds.to.format("%Y-%m-%d"),
        );
    }
    html.push_str("</fieldset>");
}

// =============================================================================
// Summary Blocks
// =============================================================================

fn card(html: &mut String, label: &str, value: &str) {
    let _ = write!(
        html,
        "<div class=\"card\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
        escape_html(label),
        escape_html(value)
    );
}

fn standout(value: Option<&Standout>, fmt: impl Fn(f64) -> String) -> String {
    value.map_or_else(
        || "N/A".to_string(),
        |s| format!("{} {}", s.asset, fmt(s.value)),
    )
}

fn highlights_strip(html: &mut String, view: &DashboardView) {
    let h = &view.highlights;
    html.push_str("<div class=\"highlights\">");
    card(html, "Assets", &h.asset_count.to_string());
    card(html, "Days analysed", &h.days_analysed.to_string());
    card(
        html,
        "Best performer",
        &standout(h.best_performer.as_ref(), |v| format_pct(Some(v))),
    );
    card(
        html,
        "Worst performer",
        &standout(h.worst_performer.as_ref(), |v| format_pct(Some(v))),
    );
    card(
        html,
        "Best Sharpe",
        &standout(h.best_sharpe.as_ref(), |v| format_ratio(Some(v))),
    );
    html.push_str("</div>");
}

fn warnings(html: &mut String, view: &DashboardView, load_warnings: &[RowWarning]) {
    if view.warnings.is_empty() && load_warnings.is_empty() {
        return;
    }
    html.push_str("<div class=\"warnings\">");
    if !view.warnings.is_empty() {
        html.push_str("<strong>Computation warnings</strong><ul>");
        for warning in &view.warnings {
            let _ = write!(html, "<li>{}</li>", escape_html(&warning.to_string()));
        }
        html.push_str("</ul>");
    }
    if !load_warnings.is_empty() {
        let _ = write!(
            html,
            "<details><summary>{} rows skipped while loading</summary><ul>",
            load_warnings.len()
        );
        for warning in load_warnings {
            let _ = write!(html, "<li>{}</li>", escape_html(&warning.to_string()));
        }
        html.push_str("</ul></details>");
    }
    html.push_str("</div>");
}

// =============================================================================
// Panels
// =============================================================================

fn asset_list(assets: &[AssetId]) -> String {
    if assets.is_empty() {
        return "<span class=\"muted\">none</span>".to_string();
    }
    assets
        .iter()
        .map(|a| escape_html(a.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn risk_return_panel(html: &mut String, view: &DashboardView) {
    let q = &view.quadrants;
    let body = format!(
        "{}<div class=\"pairs\"><div><strong>Higher return, lower risk:</strong> {}</div>\
         <div><strong>Lower return, higher risk:</strong> {}</div></div>\
         <p class=\"muted\">Median total return {}, median annual volatility {}.</p>",
        risk_return_scatter(&view.metrics, q),
        asset_list(&q.ideal),
        asset_list(&q.avoid),
        format_pct(q.median_return),
        format_pct(q.median_volatility),
    );
    panel_box(html, Panel::RiskReturn, &body);
}

fn metrics_panel(html: &mut String, view: &DashboardView, query: &str) {
    let table = &view.table;
    let mut body = String::new();

    let _ = write!(
        body,
        "<p>Filter <input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"asset contains\"> \
         <button type=\"submit\">Apply</button></p><div class=\"columns\">",
        escape_html(table.filter.as_deref().unwrap_or(""))
    );
    for column in MetricColumn::ALL {
        let checked = if table.columns.contains(&column) {
            " checked"
        } else {
            ""
        };
        let _ = write!(
            body,
            "<label><input type=\"checkbox\" name=\"columns\" value=\"{}\"{checked}> {}</label>",
            column.key(),
            column.label()
        );
    }
    body.push_str("</div><table><thead><tr><th>Asset</th>");
    for column in &table.columns {
        let _ = write!(body, "<th>{}</th>", column.label());
    }
    body.push_str("</tr></thead><tbody>");

    for row in &table.rows {
        let _ = write!(body, "<tr><td>{}</td>", escape_html(row.asset.as_str()));
        for column in &table.columns {
            let _ = write!(body, "<td>{}</td>", format_metric(*column, row.value(*column)));
        }
        body.push_str("</tr>");
    }
    if table.rows.is_empty() {
        let _ = write!(
            body,
            "<tr><td colspan=\"{}\" class=\"muted\">No assets match the filter.</td></tr>",
            table.columns.len() + 1
        );
    }

    let suffix = if query.is_empty() {
        String::new()
    } else {
        format!("?{}", escape_html(query))
    };
    let _ = write!(
        body,
        "</tbody></table><p>Download <a href=\"/export/metrics.csv{suffix}\">metrics CSV</a> \
         &middot; <a href=\"/export/prices.csv{suffix}\">prices CSV</a></p>"
    );

    panel_box(html, Panel::MetricsTable, &body);
}

fn pair_list(title: &str, pairs: &[CorrelatedPair]) -> String {
    let mut out = format!("<div><strong>{title}</strong><ol>");
    for pair in pairs {
        let _ = write!(
            out,
            "<li>{} / {}: {}</li>",
            escape_html(pair.first.as_str()),
            escape_html(pair.second.as_str()),
            format_ratio(Some(pair.correlation))
        );
    }
    if pairs.is_empty() {
        out.push_str("<li class=\"muted\">not enough data</li>");
    }
    out.push_str("</ol></div>");
    out
}

fn correlation_panel(html: &mut String, view: &DashboardView) {
    let body = format!(
        "{}<div class=\"pairs\">{}{}</div>",
        correlation_heatmap(&view.correlation),
        pair_list("Most correlated", &view.ranked_pairs.most),
        pair_list("Least correlated", &view.ranked_pairs.least),
    );
    panel_box(html, Panel::Correlation, &body);
}

fn distribution_panel(html: &mut String, view: &DashboardView) {
    let mut body = String::new();
    let current = view.distribution.as_ref().map(|d| &d.asset);

    body.push_str("<p>Asset <select name=\"detail\" onchange=\"this.form.submit()\">");
    for asset in &view.selected {
        let selected = if Some(asset) == current { " selected" } else { "" };
        let name = escape_html(asset.as_str());
        let _ = write!(body, "<option value=\"{name}\"{selected}>{name}</option>");
    }
    body.push_str("</select></p>");

    match &view.distribution {
        Some(stats) if stats.observations > 0 => {
            body.push_str(&return_histogram(stats));
            let skew = stats.skew_shape().map_or("N/A", |s| s.label());
            let tails = stats.tail_shape().map_or("N/A", |t| t.label());
            let _ = write!(
                body,
                "<table><tbody>\
                 <tr><td>Observations</td><td>{}</td></tr>\
                 <tr><td>Mean daily return</td><td>{}</td></tr>\
                 <tr><td>Daily volatility</td><td>{}</td></tr>\
                 <tr><td>Skewness</td><td>{} ({skew})</td></tr>\
                 <tr><td>Excess kurtosis</td><td>{} ({tails})</td></tr>\
                 </tbody></table>",
                stats.observations,
                format_pct(stats.mean),
                format_pct(stats.std_dev),
                format_ratio(stats.skewness),
                format_ratio(stats.excess_kurtosis),
            );
        }
        _ => body.push_str("<p class=\"muted\">Not enough returns to describe.</p>"),
    }

    if let Some(metrics) = current.and_then(|a| view.metrics.iter().find(|m| &m.asset == a)) {
        let _ = write!(
            body,
            "<p class=\"muted\">Price {} to {}, max drawdown {}.</p>",
            format_price(metrics.initial_price),
            format_price(metrics.final_price),
            format_pct(metrics.max_drawdown),
        );
    }

    panel_box(html, Panel::Distribution, &body);
}
