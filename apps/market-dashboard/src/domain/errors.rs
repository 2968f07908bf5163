//! Error and warning taxonomy for loading and analysing price data.
//!
//! Fatal problems are [`DataError`]s and abort startup. Row-level problems
//! found while reading a file are [`RowWarning`]s: the row is skipped and
//! loading continues. Analytics that cannot be computed for a subset of the
//! data raise [`ComputationWarning`]s, which are shown next to the affected
//! view instead of failing the request.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::series::AssetId;

/// Fatal data loading error.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// File is structurally unusable: missing required columns, unreadable
    /// header, or a non-positive price.
    #[error("data format error in '{}': {reason}", path.display())]
    DataFormat {
        /// File the error was found in.
        path: PathBuf,
        /// Human readable explanation.
        reason: String,
    },

    /// Expected file or directory does not exist.
    #[error("missing data file: '{}'", path.display())]
    MissingFile {
        /// Path that was expected.
        path: PathBuf,
    },

    /// Directory exists but holds no CSV files.
    #[error("no CSV files found in '{}'", path.display())]
    NoCsvFiles {
        /// Directory that was scanned.
        path: PathBuf,
    },
}

impl DataError {
    /// Build a [`DataError::DataFormat`] for `path`.
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DataFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error means an expected file is absent.
    #[must_use]
    pub const fn is_missing_file(&self) -> bool {
        matches!(self, Self::MissingFile { .. } | Self::NoCsvFiles { .. })
    }
}

/// A skipped input row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowWarning {
    /// File name the row came from.
    pub file: String,
    /// 1-based line number, header included.
    pub line: u64,
    /// Why the row was skipped.
    pub reason: String,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.reason)
    }
}

/// Non-fatal analytics problem surfaced inline in the rendered view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComputationWarning {
    /// A pair shares fewer than two return observations.
    InsufficientOverlap {
        /// First asset of the pair.
        first: AssetId,
        /// Second asset of the pair.
        second: AssetId,
        /// Number of shared observations.
        observations: usize,
    },
    /// A pair cannot be correlated because one side does not move.
    ZeroVariance {
        /// First asset of the pair.
        first: AssetId,
        /// Second asset of the pair.
        second: AssetId,
    },
    /// An asset has too few returns for dispersion statistics.
    InsufficientHistory {
        /// Affected asset.
        asset: AssetId,
        /// Number of available returns.
        observations: usize,
    },
    /// An asset's returns are all identical.
    ConstantSeries {
        /// Affected asset.
        asset: AssetId,
    },
}

impl fmt::Display for ComputationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientOverlap {
                first,
                second,
                observations,
            } => write!(
                f,
                "correlation {first} / {second} undefined: {observations} overlapping observation(s), need at least 2"
            ),
            Self::ZeroVariance { first, second } => write!(
                f,
                "correlation {first} / {second} undefined: zero variance over the overlapping dates"
            ),
            Self::InsufficientHistory {
                asset,
                observations,
            } => write!(
                f,
                "{asset}: only {observations} return(s) in range, risk metrics unavailable"
            ),
            Self::ConstantSeries { asset } => {
                write!(f, "{asset}: returns are constant, ratios unavailable")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_classification() {
        let missing = DataError::MissingFile {
            path: PathBuf::from("data"),
        };
        let empty = DataError::NoCsvFiles {
            path: PathBuf::from("data"),
        };
        let format = DataError::format("prices.csv", "missing date column");

        assert!(missing.is_missing_file());
        assert!(empty.is_missing_file());
        assert!(!format.is_missing_file());
    }

    #[test]
    fn data_format_message_names_file() {
        let err = DataError::format("prices.csv", "missing date column");
        assert_eq!(
            err.to_string(),
            "data format error in 'prices.csv': missing date column"
        );
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = ComputationWarning::InsufficientOverlap {
            first: AssetId::new("AAPL"),
            second: AssetId::new("MSFT"),
            observations: 1,
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "insufficient_overlap");
        assert_eq!(json["first"], "AAPL");
        assert_eq!(json["observations"], 1);
    }

    #[test]
    fn row_warning_display() {
        let warning = RowWarning {
            file: "prices.csv".to_string(),
            line: 7,
            reason: "unparseable date 'yesterday'".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "prices.csv:7: unparseable date 'yesterday'"
        );
    }
}
