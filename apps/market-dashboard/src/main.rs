//! Market Dashboard Binary
//!
//! Loads a directory of price CSV files and serves the dashboard on
//! localhost.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p market-dashboard -- --data-dir data
//! cargo run -p market-dashboard -- --config dashboard.yaml --port 8080
//! cargo run -p market-dashboard -- --data-dir data --snapshot dashboard.html
//! ```
//!
//! # Environment Variables
//!
//! - `DASHBOARD_CONFIG`: YAML configuration file
//! - `DASHBOARD_DATA_DIR`: directory of price CSV files (default: data)
//! - `DASHBOARD_HOST`: bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT`: listen port (default: 8501)
//! - `DASHBOARD_PERIODS_PER_YEAR`: annualization factor (default: 252)
//! - `DASHBOARD_RISK_FREE_RATE`: annual risk-free rate (default: 0.0)
//! - `OTEL_ENABLED`: export traces over OTLP (default: false)
//! - `RUST_LOG`: log filter (default: `market_dashboard=info`)
//!
//! Command-line flags override the environment, which overrides the YAML
//! file.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use market_dashboard::infrastructure::config::{DashboardConfig, load_config, validate_config};
use market_dashboard::infrastructure::telemetry;
use market_dashboard::{init_metrics, render_dashboard, render_snapshot};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Local dashboard for price series, returns, risk metrics and correlations.
#[derive(Debug, Parser)]
#[command(name = "market-dashboard", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, env = "DASHBOARD_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of price CSV files.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on.
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Write the default view to this HTML file and exit instead of serving.
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(dir) = &self.data_dir {
            config.data.dir.clone_from(dir);
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    load_dotenv();

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let _telemetry_guard = telemetry::init().context("failed to initialise tracing")?;

    let config = resolve_config(&cli)?;
    log_config(&config);

    if let Some(output) = &cli.snapshot {
        return render_snapshot(&config, output).with_context(|| {
            format!(
                "failed to render snapshot of '{}'",
                config.data.dir.display()
            )
        });
    }

    let _metrics_handle = init_metrics();

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    render_dashboard(&config, shutdown)
        .await
        .with_context(|| format!("dashboard failed for '{}'", config.data.dir.display()))?;

    tracing::info!("Dashboard stopped");
    Ok(())
}

/// Defaults, then the YAML file, then `DASHBOARD_*` variables, then flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<DashboardConfig> {
    let mut config = load_config(cli.config.as_deref()).with_context(|| {
        format!(
            "failed to load configuration from '{}'",
            cli.config.as_deref().map_or_else(String::new, |p| p.display().to_string())
        )
    })?;
    config.apply_env();
    cli.apply(&mut config);
    validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

/// Log the resolved configuration.
fn log_config(config: &DashboardConfig) {
    tracing::info!(
        data_dir = %config.data.dir.display(),
        addr = %config.server.addr(),
        periods_per_year = config.analytics.periods_per_year,
        risk_free_rate = config.analytics.risk_free_rate,
        panels = config.panels.len(),
        groups = config.groups.len(),
        "Configuration loaded"
    );
}

/// Load the nearest `.env`, searching upward from the working directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    if let Some(found) = cwd
        .ancestors()
        .skip(1)
        .map(|dir| dir.join(".env"))
        .find(|candidate| candidate.is_file())
    {
        let _ = dotenvy::from_path(&found);
    }
}

/// Cancel `shutdown` on Ctrl+C, or SIGTERM on Unix.
#[allow(clippy::expect_used)]
async fn cancel_on_signal(shutdown: CancellationToken) {
    let interrupt = async {
        signal::ctrl_c().await.expect("failed to listen for Ctrl+C");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal_name = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal = signal_name, "Stopping dashboard");

    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::try_parse_from([
            "market-dashboard",
            "--data-dir",
            "/tmp/prices",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
        ])
        .unwrap();

        let mut config = DashboardConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.data.dir, PathBuf::from("/tmp/prices"));
        assert_eq!(config.server.addr().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn absent_flags_keep_config() {
        let cli = Cli::try_parse_from(["market-dashboard"]).unwrap();
        let mut config = DashboardConfig::default();
        cli.apply(&mut config);
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn flag_repairs_invalid_yaml_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.yaml");
        std::fs::write(&path, "server:\n  port: 0\n").unwrap();

        let cli = Cli::try_parse_from([
            "market-dashboard",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "8080",
        ])
        .unwrap();

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Cli::try_parse_from(["market-dashboard", "--port", "99999"]).is_err());
    }
}
