//! Dashboard Configuration Settings
//!
//! Configuration types for the dashboard, deserialized from YAML and then
//! overridden from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::application::{AssetGroup, DashboardSettings, Panel};
use crate::domain::analytics::{
    AnalyticsParams, DEFAULT_HISTOGRAM_BINS, DEFAULT_RANKED_PAIRS, MetricColumn, TRADING_DAYS,
};
use crate::domain::series::AssetId;
use crate::domain::window::Preset;

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// Socket address to bind.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

const fn default_port() -> u16 {
    8501
}

/// Where price files are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Directory scanned for `*.csv` files.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Analytics parameters and view defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Return periods per year.
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
    /// Annual risk-free rate as a fraction.
    #[serde(default)]
    pub risk_free_rate: f64,
    /// Histogram bins.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    /// Pairs per correlation ranking.
    #[serde(default = "default_ranked_pairs")]
    pub ranked_pairs: usize,
    /// Preset applied when a request names no range.
    #[serde(default)]
    pub default_preset: Preset,
    /// Table columns shown when a request names none.
    #[serde(default = "default_columns")]
    pub default_columns: Vec<MetricColumn>,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            periods_per_year: default_periods_per_year(),
            risk_free_rate: 0.0,
            histogram_bins: default_histogram_bins(),
            ranked_pairs: default_ranked_pairs(),
            default_preset: Preset::All,
            default_columns: default_columns(),
        }
    }
}

const fn default_periods_per_year() -> u32 {
    TRADING_DAYS
}

const fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

const fn default_ranked_pairs() -> usize {
    DEFAULT_RANKED_PAIRS
}

fn default_columns() -> Vec<MetricColumn> {
    MetricColumn::DEFAULTS.to_vec()
}

/// A named asset group as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Group name.
    pub name: String,
    /// Member asset identifiers.
    #[serde(default)]
    pub assets: Vec<String>,
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerSettings,
    /// Price data location.
    #[serde(default)]
    pub data: DataSettings,
    /// Analytics parameters.
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    /// Enabled panels in page order.
    #[serde(default = "default_panels")]
    pub panels: Vec<Panel>,
    /// Named asset groups.
    #[serde(default)]
    pub groups: Vec<GroupSettings>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            data: DataSettings::default(),
            analytics: AnalyticsSettings::default(),
            panels: default_panels(),
            groups: Vec::new(),
        }
    }
}

fn default_panels() -> Vec<Panel> {
    Panel::ALL.to_vec()
}

impl DashboardConfig {
    /// Apply `DASHBOARD_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `DASHBOARD_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("DASHBOARD_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data.dir = PathBuf::from(dir);
        }
        self.server.host = parse_env(&lookup, "DASHBOARD_HOST", self.server.host);
        self.server.port = parse_env(&lookup, "DASHBOARD_PORT", self.server.port);
        self.analytics.periods_per_year = parse_env(
            &lookup,
            "DASHBOARD_PERIODS_PER_YEAR",
            self.analytics.periods_per_year,
        );
        self.analytics.risk_free_rate = parse_env(
            &lookup,
            "DASHBOARD_RISK_FREE_RATE",
            self.analytics.risk_free_rate,
        );
    }

    /// Settings handed to the dashboard service.
    #[must_use]
    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            analytics: AnalyticsParams {
                periods_per_year: self.analytics.periods_per_year,
                risk_free_rate: self.analytics.risk_free_rate,
                histogram_bins: self.analytics.histogram_bins,
                ranked_pairs: self.analytics.ranked_pairs,
            },
            panels: self.panels.clone(),
            groups: self
                .groups
                .iter()
                .map(|g| AssetGroup {
                    name: g.name.clone(),
                    assets: g.assets.iter().map(AssetId::new).collect(),
                })
                .collect(),
            default_preset: self.analytics.default_preset,
            default_columns: self.analytics.default_columns.clone(),
        }
    }
}

fn parse_env<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.server.addr().to_string(), "127.0.0.1:8501");
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(config.analytics.periods_per_year, 252);
        assert_eq!(config.panels.len(), 6);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(lookup(&[
            ("DASHBOARD_DATA_DIR", "/srv/prices"),
            ("DASHBOARD_HOST", "0.0.0.0"),
            ("DASHBOARD_PORT", "9000"),
            ("DASHBOARD_RISK_FREE_RATE", "0.04"),
        ]));

        assert_eq!(config.data.dir, PathBuf::from("/srv/prices"));
        assert_eq!(config.server.addr().to_string(), "0.0.0.0:9000");
        assert!((config.analytics.risk_free_rate - 0.04).abs() < f64::EPSILON);
    }

    #[test]
    fn unparseable_overrides_are_ignored() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(lookup(&[
            ("DASHBOARD_PORT", "not-a-port"),
            ("DASHBOARD_PERIODS_PER_YEAR", "-1"),
        ]));
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.analytics.periods_per_year, 252);
    }

    #[test]
    fn groups_become_asset_ids() {
        let config = DashboardConfig {
            groups: vec![GroupSettings {
                name: "Tech".to_string(),
                assets: vec![" AAPL ".to_string(), "MSFT".to_string()],
            }],
            ..DashboardConfig::default()
        };
        let settings = config.dashboard_settings();
        assert_eq!(
            settings.groups[0].assets,
            vec![AssetId::new("AAPL"), AssetId::new("MSFT")]
        );
    }
}
