//! CSV file adapters: reading price files and producing downloads.

mod export;
mod loader;

pub use export::{metrics_csv, prices_csv};
pub use loader::{CsvDirectorySource, load_directory, load_series};
