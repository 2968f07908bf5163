//! Configuration Module
//!
//! Layered configuration for the dashboard: built-in defaults, an optional
//! YAML file with environment variable interpolation, `DASHBOARD_*`
//! environment overrides, and finally command-line flags applied by the
//! binary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use market_dashboard::infrastructure::config::load_config;
//!
//! let mut config = load_config(Some(Path::new("dashboard.yaml")))?;
//! config.apply_env();
//! validate_config(&config)?;
//! ```

mod settings;

use std::path::Path;
use std::sync::OnceLock;

use thiserror::Error;

pub use settings::{
    AnalyticsSettings, DashboardConfig, DataSettings, GroupSettings, ServerSettings,
};

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML file is unreadable.
    #[error("cannot read '{path}': {source}")]
    ReadError {
        /// Config file path.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The YAML is malformed or names an unknown panel, column or preset.
    #[error("invalid YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// A value is out of range.
    #[error("invalid setting: {0}")]
    ValidationError(String),
}

// =============================================================================
// Loading
// =============================================================================

/// Load configuration, starting from defaults when `path` is `None`.
///
/// Environment overrides are not applied here.
///
/// # Errors
///
/// Fails when the file is unreadable or its contents are rejected by
/// [`load_config_from_string`]. Ranges are checked later by
/// [`validate_config`], once every layer is applied.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(DashboardConfig::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.display().to_string(),
        source,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Fails on malformed YAML. Values are not range-checked here.
pub fn load_config_from_string(yaml: &str) -> Result<DashboardConfig, ConfigError> {
    let expanded = expand_env(yaml);
    if expanded.trim().is_empty() {
        return Ok(DashboardConfig::default());
    }
    Ok(serde_yaml_bw::from_str(&expanded)?)
}

/// Replace `${NAME}` and `${NAME:-fallback}` with environment values.
///
/// Unset or empty variables take the fallback, or nothing.
fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

#[allow(clippy::expect_used)]
fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    static PLACEHOLDER: OnceLock<regex::Regex> = OnceLock::new();

    let placeholder = PLACEHOLDER.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("placeholder pattern compiles")
    });

    placeholder
        .replace_all(input, |cap: &regex::Captures<'_>| {
            lookup(&cap[1])
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| cap.get(2).map_or_else(String::new, |m| m.as_str().to_string()))
        })
        .into_owned()
}

/// Check ranges after all layers are applied.
///
/// # Errors
///
/// Returns [`ConfigError::ValidationError`] naming the first invalid field.
pub fn validate_config(config: &DashboardConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port must be non-zero".to_string(),
        ));
    }

    let analytics = &config.analytics;
    if analytics.periods_per_year == 0 {
        return Err(ConfigError::ValidationError(
            "analytics.periods_per_year must be positive".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&analytics.risk_free_rate) {
        return Err(ConfigError::ValidationError(
            "analytics.risk_free_rate must be between 0.0 and 1.0".to_string(),
        ));
    }

    if analytics.histogram_bins == 0 || analytics.histogram_bins > 500 {
        return Err(ConfigError::ValidationError(
            "analytics.histogram_bins must be between 1 and 500".to_string(),
        ));
    }

    if config.panels.is_empty() {
        return Err(ConfigError::ValidationError(
            "panels must list at least one panel".to_string(),
        ));
    }

    if let Some(group) = config.groups.iter().find(|g| g.name.trim().is_empty()) {
        return Err(ConfigError::ValidationError(format!(
            "group with assets {:?} has an empty name",
            group.assets
        )));
    }

    Ok(())
}
