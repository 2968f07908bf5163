#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Market Dashboard - Local Financial Metrics Viewer
//!
//! Loads closing prices from CSV files, derives daily returns, risk metrics
//! and return correlations, and serves them as an interactive page on
//! localhost.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: price and return tables, time windows, analytics
//!   - `series`: `PriceTable`, `ReturnTable`, rebasing
//!   - `window`: presets and date windows
//!   - `analytics`: summary metrics, correlation, distribution, screening
//!
//! - **Application**: the dashboard use case
//!   - `ports`: `PriceSource`
//!   - `services`: `DashboardService` answering view queries
//!   - `dto`: queries and computed views
//!
//! - **Infrastructure**: adapters
//!   - `files`: CSV loading and exports
//!   - `render`: HTML page and SVG charts
//!   - `http`: axum routes
//!   - `config`, `metrics`, `telemetry`
//!
//! # Data Flow
//!
//! ```text
//! data/*.csv ──► PriceTable ──► DashboardService ──► view(query) ──► HTML / JSON / CSV
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Pure computations with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

mod dashboard;
mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use dashboard::{load_service, render_dashboard, render_snapshot};
pub use error::DashboardError;

// Domain operations
pub use domain::analytics::{compute_correlation, summarize};
pub use domain::errors::{ComputationWarning, DataError, RowWarning};
pub use domain::series::{AssetId, PriceTable, ReturnTable, compute_returns};

// Loading and configuration
pub use infrastructure::config::{DashboardConfig, load_config, validate_config};
pub use infrastructure::files::{load_directory, load_series};
pub use infrastructure::metrics::init_metrics;
