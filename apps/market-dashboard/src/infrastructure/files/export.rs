//! CSV downloads of the metrics and price tables.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::analytics::{MetricColumn, SummaryMetrics};
use crate::domain::series::PriceTable;

/// Metrics table as CSV: an `asset` column followed by the given columns.
///
/// Values are raw fractions and ratios; undefined values are left empty.
///
/// # Errors
///
/// Returns the writer's error if serialization fails.
pub fn metrics_csv(metrics: &[SummaryMetrics], columns: &[MetricColumn]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["asset"];
    header.extend(columns.iter().map(|c| c.key()));
    writer.write_record(&header)?;

    for m in metrics {
        let mut row = vec![m.asset.to_string()];
        row.extend(
            columns
                .iter()
                .map(|c| m.value(*c).map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    finish(writer)
}

/// Price table as wide-layout CSV: `date` followed by one column per asset.
///
/// The output loads back into the same table.
///
/// # Errors
///
/// Returns the writer's error if serialization fails.
pub fn prices_csv(prices: &PriceTable) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["date".to_string()];
    header.extend(prices.assets().map(ToString::to_string));
    writer.write_record(&header)?;

    let columns: Vec<BTreeMap<NaiveDate, f64>> = prices
        .iter()
        .map(|s| s.points().iter().map(|p| (p.date, p.value)).collect())
        .collect();

    for date in prices.dates() {
        let mut row = vec![date.format("%Y-%m-%d").to_string()];
        row.extend(
            columns
                .iter()
                .map(|col| col.get(&date).map(ToString::to_string).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    finish(writer)
}

fn finish(mut writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, csv::Error> {
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::series::{AssetId, PriceTableBuilder};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn prices_in_wide_layout() {
        let mut builder = PriceTableBuilder::new();
        builder.push(AssetId::new("AAPL"), date(2), 100.5);
        builder.push(AssetId::new("AAPL"), date(3), 101.0);
        builder.push(AssetId::new("MSFT"), date(3), 300.0);

        let csv = String::from_utf8(prices_csv(&builder.build()).unwrap()).unwrap();
        assert_eq!(csv, "date,AAPL,MSFT\n2024-01-02,100.5,\n2024-01-03,101,300\n");
    }

    #[test]
    fn metrics_leave_undefined_values_empty() {
        let metrics = vec![SummaryMetrics {
            asset: AssetId::new("AAPL"),
            initial_price: 100.0,
            final_price: 110.0,
            total_return: 0.1,
            mean_return: Some(0.1),
            daily_volatility: None,
            annual_volatility: None,
            sharpe: None,
            sortino: None,
            value_at_risk: Some(0.1),
            max_return: Some(0.1),
            min_return: Some(0.1),
            max_drawdown: Some(0.0),
            observations: 1,
        }];

        let csv = metrics_csv(&metrics, &[MetricColumn::TotalReturn, MetricColumn::Sharpe]).unwrap();
        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "asset,total_return,sharpe\nAAPL,0.1,\n"
        );
    }
}
