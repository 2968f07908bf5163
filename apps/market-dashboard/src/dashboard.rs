//! Entry points that wire configuration, data loading and the server.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::{DashboardQuery, DashboardService};
use crate::domain::errors::DataError;
use crate::error::DashboardError;
use crate::infrastructure::config::DashboardConfig;
use crate::infrastructure::files::CsvDirectorySource;
use crate::infrastructure::http::{AppState, DashboardServer};
use crate::infrastructure::metrics::{record_rows_skipped, set_loaded};
use crate::infrastructure::render::{PageContext, render_page};

/// Load the configured data directory into a service.
///
/// # Errors
///
/// Returns [`DataError`] if the directory is missing or holds no valid rows.
pub fn load_service(config: &DashboardConfig) -> Result<DashboardService, DataError> {
    let source = CsvDirectorySource::new(&config.data.dir);
    let service = DashboardService::load(&source, config.dashboard_settings())?;

    set_loaded(service.prices().len(), service.prices().observation_count());
    record_rows_skipped(service.load_warnings().len() as u64);
    Ok(service)
}

/// Load the data directory and serve the dashboard until `shutdown` fires.
///
/// Data is loaded before the listener binds, so a missing directory fails
/// without serving anything.
///
/// # Errors
///
/// Returns [`DashboardError::Data`] on load failure and
/// [`DashboardError::Server`] if the listener cannot bind or the server fails.
pub async fn render_dashboard(
    config: &DashboardConfig,
    shutdown: CancellationToken,
) -> Result<(), DashboardError> {
    let service = load_service(config)?;
    let state = Arc::new(AppState::new(service));

    DashboardServer::new(config.server.addr(), state, shutdown)
        .run()
        .await?;
    Ok(())
}

/// Render the default view to a standalone HTML file.
///
/// # Errors
///
/// Returns [`DashboardError::Data`] on load failure and
/// [`DashboardError::Io`] if the file cannot be written.
pub fn render_snapshot(config: &DashboardConfig, output: &Path) -> Result<(), DashboardError> {
    let service = load_service(config)?;
    let view = service.view(&DashboardQuery::default());
    let ctx = PageContext {
        source: service.source(),
        groups: &service.settings().groups,
        load_warnings: service.load_warnings(),
        query: "",
    };

    std::fs::write(output, render_page(&view, &ctx)).map_err(|source| DashboardError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    info!(
        output = %output.display(),
        assets = view.selected.len(),
        "Wrote dashboard snapshot"
    );
    Ok(())
}
