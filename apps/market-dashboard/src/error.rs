//! Top-level error type.
//!
//! Wraps the per-layer errors so callers of [`crate::render_dashboard`] and
//! [`crate::render_snapshot`] deal with a single type.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::errors::DataError;
use crate::infrastructure::http::ServerError;

/// Any failure that stops the dashboard from serving or writing a snapshot.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Price data could not be loaded.
    #[error(transparent)]
    Data(#[from] DataError),

    /// The HTTP server failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Writing an output file failed.
    #[error("failed to write '{path}': {source}")]
    Io {
        /// Output path.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },
}

impl DashboardError {
    /// Whether the error is a missing data file or directory.
    #[must_use]
    pub const fn is_missing_file(&self) -> bool {
        matches!(self, Self::Data(e) if e.is_missing_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_data_is_distinguished_from_write_failures() {
        let missing = DashboardError::from(DataError::MissingFile {
            path: PathBuf::from("data"),
        });
        let write = DashboardError::Io {
            path: PathBuf::from("out.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };

        assert!(missing.is_missing_file());
        assert!(!write.is_missing_file());
        assert!(write.to_string().contains("out.html"));
    }
}
