//! Dashboard HTTP Server (Driver Adapter)
//!
//! Axum router serving the page, JSON views, CSV exports, health checks and
//! Prometheus metrics. Every handler computes its view from the shared,
//! immutable [`DashboardService`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Query, RawQuery, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::request::parse_query;
use super::response::{CorrelationResponse, CsvDownload, HealthResponse, SummaryResponse};
use crate::application::{DashboardService, DashboardView};
use crate::infrastructure::files::{metrics_csv, prices_csv};
use crate::infrastructure::metrics::{Route, get_metrics_handle, record_request};
use crate::infrastructure::render::{PageContext, render_page};

type QueryPairs = Query<Vec<(String, String)>>;

// =============================================================================
// State
// =============================================================================

/// Shared state for the dashboard server.
#[derive(Debug)]
pub struct AppState {
    service: DashboardService,
    version: String,
    started_at: Instant,
}

impl AppState {
    /// Wrap a loaded service.
    #[must_use]
    pub fn new(service: DashboardService) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Instant::now(),
        }
    }

    /// The dashboard service.
    #[must_use]
    pub const fn service(&self) -> &DashboardService {
        &self.service
    }

    fn view(&self, pairs: &[(String, String)]) -> (DashboardView, Instant) {
        let started = Instant::now();
        (self.service.view(&parse_query(pairs)), started)
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/summary", get(summary_handler))
        .route("/api/correlation", get(correlation_handler))
        .route("/export/metrics.csv", get(metrics_export_handler))
        .route("/export/prices.csv", get(prices_export_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// Server
// =============================================================================

/// Dashboard HTTP server.
pub struct DashboardServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    cancel: CancellationToken,
}

impl DashboardServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(addr: SocketAddr, state: Arc<AppState>, cancel: CancellationToken) -> Self {
        Self {
            addr,
            state,
            cancel,
        }
    }

    /// Bind the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::BindFailed`] if the address is unavailable.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| ServerError::BindFailed(self.addr, e.to_string()))?;
        Ok(BoundServer {
            listener,
            state: self.state,
            cancel: self.cancel,
        })
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve().await
    }
}

/// A server whose listener is bound and ready to accept connections.
pub struct BoundServer {
    listener: TcpListener,
    state: Arc<AppState>,
    cancel: CancellationToken,
}

impl BoundServer {
    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ServerFailed`] if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener
            .local_addr()
            .map_err(|e| ServerError::ServerFailed(e.to_string()))
    }

    /// Serve requests until cancelled, then drain open connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::ServerFailed`] on a fatal server error.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        tracing::info!(addr = %addr, "Dashboard listening on http://{addr}/");

        axum::serve(self.listener, create_router(self.state))
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Dashboard server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn page_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
    RawQuery(raw): RawQuery,
) -> Html<String> {
    let (view, started) = state.view(&pairs);
    let service = state.service();
    let ctx = PageContext {
        source: service.source(),
        groups: &service.settings().groups,
        load_warnings: service.load_warnings(),
        query: raw.as_deref().unwrap_or(""),
    };
    let html = render_page(&view, &ctx);
    record_request(Route::Page, started.elapsed());
    Html(html)
}

async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
) -> Json<SummaryResponse> {
    let (view, started) = state.view(&pairs);
    let response = SummaryResponse::from_view(view, state.service().load_warnings().len());
    record_request(Route::Summary, started.elapsed());
    Json(response)
}

async fn correlation_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
) -> Json<CorrelationResponse> {
    let (view, started) = state.view(&pairs);
    let response = CorrelationResponse::from_view(view);
    record_request(Route::Correlation, started.elapsed());
    Json(response)
}

async fn metrics_export_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
) -> Result<CsvDownload, (StatusCode, String)> {
    let (view, started) = state.view(&pairs);
    let body = metrics_csv(&view.table.rows, &view.table.columns).map_err(export_failed)?;
    record_request(Route::MetricsExport, started.elapsed());
    Ok(CsvDownload {
        filename: "metrics.csv",
        body,
    })
}

async fn prices_export_handler(
    State(state): State<Arc<AppState>>,
    Query(pairs): QueryPairs,
) -> Result<CsvDownload, (StatusCode, String)> {
    let (view, started) = state.view(&pairs);
    let body = prices_csv(&view.prices).map_err(export_failed)?;
    record_request(Route::PricesExport, started.elapsed());
    Ok(CsvDownload {
        filename: "prices.csv",
        body,
    })
}

fn export_failed(e: csv::Error) -> (StatusCode, String) {
    tracing::error!(error = %e, "CSV export failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "export failed".to_string(),
    )
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let service = state.service();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        source: service.source().to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        assets: service.prices().len(),
        observations: service.prices().observation_count(),
        skipped_rows: service.load_warnings().len(),
    })
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn metrics_handler() -> Response {
    let Some(handle) = get_metrics_handle() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response();
    };
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
        .into_response()
}

// =============================================================================
// Errors
// =============================================================================

/// The listener could not start or stopped abnormally.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The address is in use or not permitted.
    #[error("cannot listen on {0}: {1}")]
    BindFailed(SocketAddr, String),

    /// Accept loop failure.
    #[error("dashboard server failed: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================
