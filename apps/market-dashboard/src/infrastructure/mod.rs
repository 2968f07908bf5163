//! Infrastructure Layer
//!
//! Adapters around the application layer:
//!
//! - **Driven Adapters (Outbound)**
//!   - `files/`: CSV price loading and CSV exports
//!
//! - **Driver Adapters (Inbound)**
//!   - `http/`: axum server for the page, JSON views and downloads
//!   - `render/`: HTML page and SVG charts
//!
//! - **Cross-cutting**
//!   - `config/`: layered YAML, environment and CLI configuration
//!   - `metrics/`: Prometheus recorder
//!   - `telemetry/`: tracing subscriber and optional OTLP export

pub mod config;
pub mod files;
pub mod http;
pub mod metrics;
pub mod render;
pub mod telemetry;
