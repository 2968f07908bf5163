//! Tracing Setup
//!
//! Console logging through `tracing-subscriber`. Spans can additionally be
//! shipped to an OpenTelemetry collector over OTLP when one is running.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `market_dashboard=info,hyper=warn`)
//! - `OTEL_ENABLED`: set to "true" to export traces (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector address (default: http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: reported service name (default: market-dashboard)

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "market_dashboard=info,hyper=warn";
const DEFAULT_SERVICE_NAME: &str = "market-dashboard";
const DEFAULT_COLLECTOR: &str = "http://localhost:4317";

/// Tracing could not be set up.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The OTLP span exporter failed to build.
    #[error("failed to create OTLP exporter for '{endpoint}': {reason}")]
    Exporter {
        /// Collector address.
        endpoint: String,
        /// Exporter error text.
        reason: String,
    },
}

/// Flushes exported spans when dropped. Hold it until `main` returns.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to flush trace exporter: {e}");
        }
    }
}

/// Where traces go besides the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingSettings {
    /// Collector address, `None` for console only.
    pub collector: Option<String>,
    /// Service name attached to exported spans.
    pub service_name: String,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            collector: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl TracingSettings {
    /// Read settings from `OTEL_*` variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup("OTEL_ENABLED").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Self {
            collector: enabled.then(|| {
                lookup("OTEL_EXPORTER_OTLP_ENDPOINT")
                    .filter(|v| !v.is_empty())
                    .unwrap_or_else(|| DEFAULT_COLLECTOR.to_string())
            }),
            service_name: lookup("OTEL_SERVICE_NAME")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
        }
    }
}

/// Install the global subscriber using [`TracingSettings::from_env`].
///
/// # Errors
///
/// Returns [`TelemetryError`] if export is enabled and the exporter cannot
/// be built.
pub fn init() -> Result<TelemetryGuard, TelemetryError> {
    init_with(&TracingSettings::from_env())
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] if export is enabled and the exporter cannot
/// be built.
pub fn init_with(settings: &TracingSettings) -> Result<TelemetryGuard, TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let provider = settings
        .collector
        .as_deref()
        .map(|endpoint| tracer_provider(endpoint, &settings.service_name))
        .transpose()?;

    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer(settings.service_name.clone()))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).compact())
        .with(otel_layer)
        .init();

    if let Some(endpoint) = &settings.collector {
        tracing::info!(endpoint = %endpoint, "Exporting traces over OTLP");
    }

    Ok(TelemetryGuard { provider })
}

fn tracer_provider(endpoint: &str, service_name: &str) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_string())
                .build(),
        )
        .build())
}
