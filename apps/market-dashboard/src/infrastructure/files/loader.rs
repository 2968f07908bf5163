//! CSV price file reader.
//!
//! Two layouts are understood. A *long* file has a date column, an asset
//! column and a price column, one row per (date, asset). A *wide* file has a
//! date column and one price column per asset; empty cells mean the asset has
//! no price that day. Header names are matched case-insensitively.
//!
//! A file is long only when a column named like an asset column holds
//! non-numeric names. A wide file whose assets happen to be called `Ticker`
//! or `Close` therefore still loads as wide.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::debug;

use crate::application::PriceSource;
use crate::domain::errors::{DataError, RowWarning};
use crate::domain::series::{AssetId, LoadedPrices, PriceTableBuilder, is_valid_price};

const DATE_COLUMNS: [&str; 4] = ["date", "datetime", "timestamp", "day"];
const ASSET_COLUMNS: [&str; 3] = ["asset", "symbol", "ticker"];
const PRICE_COLUMNS: [&str; 3] = ["close", "adj_close", "price"];

/// Column positions resolved from the header row.
enum Layout {
    Long { asset: usize, price: usize },
    Wide { assets: Vec<(usize, AssetId)> },
}

/// Rows accumulated across one or more files.
#[derive(Default)]
struct Accumulator {
    builder: PriceTableBuilder,
    warnings: Vec<RowWarning>,
}

impl Accumulator {
    fn finish(self) -> LoadedPrices {
        LoadedPrices {
            table: self.builder.build(),
            warnings: self.warnings,
        }
    }
}

/// Parse one CSV file into a price table.
///
/// # Errors
///
/// - [`DataError::MissingFile`] if `path` does not exist.
/// - [`DataError::DataFormat`] if the header lacks a date column, a long
///   file lacks a price column, or any price is zero or negative.
pub fn load_series(path: &Path) -> Result<LoadedPrices, DataError> {
    let mut acc = Accumulator::default();
    read_file(path, &mut acc)?;
    Ok(acc.finish())
}

/// Parse every `*.csv` file in `dir`, in file-name order, into one table.
///
/// A (date, asset) pair seen in an earlier file wins over later ones. A
/// path naming a single file is loaded on its own.
///
/// # Errors
///
/// - [`DataError::MissingFile`] if `dir` does not exist.
/// - [`DataError::NoCsvFiles`] if it holds no CSV file.
/// - Any error of [`load_series`] for the individual files.
pub fn load_directory(dir: &Path) -> Result<LoadedPrices, DataError> {
    if !dir.exists() {
        return Err(DataError::MissingFile {
            path: dir.to_path_buf(),
        });
    }
    if dir.is_file() {
        return load_series(dir);
    }

    let files = csv_files(dir)?;
    if files.is_empty() {
        return Err(DataError::NoCsvFiles {
            path: dir.to_path_buf(),
        });
    }

    let mut acc = Accumulator::default();
    for file in &files {
        read_file(file, &mut acc)?;
    }
    Ok(acc.finish())
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, DataError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, &e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| io_error(dir, &e))?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn io_error(path: &Path, err: &io::Error) -> DataError {
    if err.kind() == io::ErrorKind::NotFound {
        DataError::MissingFile {
            path: path.to_path_buf(),
        }
    } else {
        DataError::format(path, format!("cannot read: {err}"))
    }
}

fn read_file(path: &Path, acc: &mut Accumulator) -> Result<(), DataError> {
    let file = File::open(path).map_err(|e| io_error(path, &e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| DataError::format(path, format!("unreadable header: {e}")))?
        .clone();
    let names: Vec<String> = headers.iter().map(normalize_header).collect();

    let date_idx = find_column(&names, &DATE_COLUMNS).ok_or_else(|| {
        DataError::format(
            path,
            format!("missing date column (expected one of: {})", DATE_COLUMNS.join(", ")),
        )
    })?;
    let records: Vec<csv::Result<csv::StringRecord>> = reader.records().collect();
    let layout = resolve_layout(path, &headers, &names, date_idx, &records)?;

    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let before = acc.builder.row_count();
    let skipped_before = acc.warnings.len();

    for (idx, result) in records.into_iter().enumerate() {
        let fallback_line = idx as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(fallback_line, csv::Position::line);
                acc.warnings.push(row_warning(&file_name, line, e.to_string()));
                continue;
            }
        };
        let line = record.position().map_or(fallback_line, csv::Position::line);

        let date = match record.get(date_idx).map(parse_date) {
            Some(Ok(date)) => date,
            Some(Err(reason)) => {
                acc.warnings.push(row_warning(&file_name, line, reason));
                continue;
            }
            None => {
                acc.warnings.push(row_warning(&file_name, line, "missing date".to_string()));
                continue;
            }
        };

        match &layout {
            Layout::Long { asset, price } => {
                let asset = record.get(*asset).unwrap_or_default();
                if asset.is_empty() {
                    acc.warnings.push(row_warning(&file_name, line, "missing asset".to_string()));
                    continue;
                }
                let cell = record.get(*price).unwrap_or_default();
                if cell.is_empty() {
                    acc.warnings.push(row_warning(&file_name, line, "missing price".to_string()));
                    continue;
                }
                record_price(path, &file_name, line, AssetId::new(asset), date, cell, acc)?;
            }
            Layout::Wide { assets } => {
                for (col, asset) in assets {
                    let cell = record.get(*col).unwrap_or_default();
                    if cell.is_empty() {
                        continue;
                    }
                    record_price(path, &file_name, line, asset.clone(), date, cell, acc)?;
                }
            }
        }
    }

    debug!(
        file = %file_name,
        rows = acc.builder.row_count() - before,
        skipped = acc.warnings.len() - skipped_before,
        "Parsed price file"
    );
    Ok(())
}

fn resolve_layout(
    path: &Path,
    headers: &csv::StringRecord,
    names: &[String],
    date_idx: usize,
    records: &[csv::Result<csv::StringRecord>],
) -> Result<Layout, DataError> {
    if let Some(asset) = find_column(names, &ASSET_COLUMNS).filter(|col| holds_names(records, *col)) {
        let price = find_column(names, &PRICE_COLUMNS).ok_or_else(|| {
            DataError::format(
                path,
                format!("missing price column (expected one of: {})", PRICE_COLUMNS.join(", ")),
            )
        })?;
        return Ok(Layout::Long { asset, price });
    }

    let assets: Vec<(usize, AssetId)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, name)| *idx != date_idx && !name.is_empty())
        .map(|(idx, name)| (idx, AssetId::new(name)))
        .collect();
    if assets.is_empty() {
        return Err(DataError::format(path, "no asset price columns"));
    }
    Ok(Layout::Wide { assets })
}

/// Whether column `col` contains at least one non-numeric cell.
fn holds_names(records: &[csv::Result<csv::StringRecord>], col: usize) -> bool {
    records
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .filter_map(|r| r.get(col))
        .any(|cell| !cell.is_empty() && cell.parse::<f64>().is_err())
}

fn record_price(
    path: &Path,
    file_name: &str,
    line: u64,
    asset: AssetId,
    date: NaiveDate,
    cell: &str,
    acc: &mut Accumulator,
) -> Result<(), DataError> {
    let Ok(price) = cell.parse::<f64>() else {
        acc.warnings.push(row_warning(file_name, line, format!("unparseable price '{cell}' for {asset}")));
        return Ok(());
    };
    if !price.is_finite() {
        acc.warnings.push(row_warning(file_name, line, format!("non-finite price for {asset}")));
        return Ok(());
    }
    if !is_valid_price(price) {
        return Err(DataError::format(
            path,
            format!("non-positive price {price} for {asset} on {date} (line {line})"),
        ));
    }
    if !acc.builder.push(asset.clone(), date, price) {
        acc.warnings.push(row_warning(
            file_name,
            line,
            format!("duplicate price for {asset} on {date}, keeping the first"),
        ));
    }
    Ok(())
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

fn find_column(names: &[String], aliases: &[&str]) -> Option<usize> {
    aliases
        .iter()
        .find_map(|alias| names.iter().position(|n| n == alias))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(field: &str) -> Result<NaiveDate, String> {
    let day = match field.get(..10) {
        Some(prefix) if field.len() == 10 || field[10..].starts_with([' ', 'T']) => prefix,
        _ => field,
    };
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| {
        if field.is_empty() {
            "missing date".to_string()
        } else {
            format!("unparseable date '{field}'")
        }
    })
}

fn row_warning(file: &str, line: u64, reason: String) -> RowWarning {
    RowWarning {
        file: file.to_string(),
        line,
        reason,
    }
}

// =============================================================================
// Price Source Adapter
// =============================================================================

/// [`PriceSource`] reading every CSV file of a directory.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    /// Create a source for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PriceSource for CsvDirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn load(&self) -> Result<LoadedPrices, DataError> {
        load_directory(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use test_case::test_case;

    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn values(loaded: &LoadedPrices, asset: &str) -> Vec<f64> {
        loaded
            .table
            .get(&AssetId::new(asset))
            .map(|s| s.points().iter().map(|p| p.value).collect())
            .unwrap_or_default()
    }

    #[test]
    fn long_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "prices.csv",
            "Date,Symbol,Close\n2024-01-03,AAPL,101\n2024-01-02,AAPL,100\n2024-01-02,MSFT,300\n",
        );

        let loaded = load_series(&path).unwrap();
        assert_eq!(values(&loaded, "AAPL"), vec![100.0, 101.0]);
        assert_eq!(values(&loaded, "MSFT"), vec![300.0]);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn wide_layout_skips_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "wide.csv",
            "date,AAPL,MSFT\n2024-01-02,100,\n2024-01-03,101,301\n",
        );

        let loaded = load_series(&path).unwrap();
        assert_eq!(values(&loaded, "AAPL"), vec![100.0, 101.0]);
        assert_eq!(values(&loaded, "MSFT"), vec![301.0]);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn missing_date_column_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", "symbol,close\nAAPL,100\n");

        let err = load_series(&path).unwrap_err();
        assert!(matches!(err, DataError::DataFormat { .. }));
        assert!(err.to_string().contains("missing date column"));
    }

    #[test]
    fn long_layout_without_price_column_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", "date,ticker,volume\n2024-01-02,AAPL,10\n");

        let err = load_series(&path).unwrap_err();
        assert!(err.to_string().contains("missing price column"));
    }

    #[test]
    fn numeric_ticker_column_is_a_wide_asset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "export.csv",
            "date,Close,Ticker\n2024-01-02,10,20\n2024-01-03,,21\n",
        );

        let loaded = load_series(&path).unwrap();
        assert_eq!(values(&loaded, "Close"), vec![10.0]);
        assert_eq!(values(&loaded, "Ticker"), vec![20.0, 21.0]);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn non_positive_price_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", "date,AAPL\n2024-01-02,100\n2024-01-03,-5\n");

        let err = load_series(&path).unwrap_err();
        assert!(matches!(err, DataError::DataFormat { .. }));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn malformed_rows_become_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "prices.csv",
            "date,asset,close\n2024-01-02,AAPL,100\nyesterday,AAPL,101\n2024-01-04,AAPL,abc\n2024-01-05,,102\n2024-01-06,AAPL,103\n",
        );

        let loaded = load_series(&path).unwrap();
        assert_eq!(values(&loaded, "AAPL"), vec![100.0, 103.0]);
        let lines: Vec<u64> = loaded.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(loaded.warnings[0].reason.contains("unparseable date"));
        assert_eq!(loaded.warnings[0].file, "prices.csv");
    }

    #[test]
    fn duplicate_rows_keep_first_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "prices.csv",
            "date,asset,close\n2024-01-02,AAPL,100\n2024-01-02,AAPL,999\n",
        );

        let loaded = load_series(&path).unwrap();
        assert_eq!(values(&loaded, "AAPL"), vec![100.0]);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].reason.contains("duplicate"));
    }

    #[test_case("2024-01-02", true ; "plain date")]
    #[test_case("2024-01-02 00:00:00", true ; "datetime with space")]
    #[test_case("2024-01-02T16:00:00Z", true ; "iso datetime")]
    #[test_case("2024-01-021", false ; "trailing digit")]
    #[test_case("02/01/2024", false ; "day first")]
    #[test_case("", false ; "empty")]
    fn date_formats(input: &str, ok: bool) {
        assert_eq!(parse_date(input).is_ok(), ok);
    }

    #[test]
    fn directory_merges_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b.csv", "date,AAPL\n2024-01-02,999\n2024-01-03,101\n");
        write_file(dir.path(), "a.csv", "date,AAPL\n2024-01-02,100\n");
        write_file(dir.path(), "notes.txt", "not a price file");

        let loaded = load_directory(dir.path()).unwrap();
        assert_eq!(values(&loaded, "AAPL"), vec![100.0, 101.0]);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].file, "b.csv");
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_directory(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DataError::MissingFile { .. }));
    }

    #[test]
    fn directory_without_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "readme.md", "# prices");
        let err = load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, DataError::NoCsvFiles { .. }));
    }

    #[test]
    fn source_adapter_describes_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "p.csv", "date,X\n2024-01-02,1\n");
        let source = CsvDirectorySource::new(dir.path());

        assert_eq!(source.describe(), dir.path().display().to_string());
        assert_eq!(source.load().unwrap().table.len(), 1);
    }
}
