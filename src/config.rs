//! Runtime configuration, read from the environment.
//!
//! Warehouse credentials are part of the database URL supplied by the
//! hosting environment and are never logged.

use std::env;
use std::time::Duration;

/// Default port if not specified via environment variable.
pub const DEFAULT_PORT: u16 = 3000;

/// Default database URL if not specified via environment variable.
pub const DEFAULT_DATABASE_URL: &str = "sqlite:aqi.db?mode=rwc";

/// Default per-query timeout in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// sqlx connection string for the AQI warehouse.
    pub database_url: String,

    /// Upper bound on any single warehouse query.
    pub query_timeout: Duration,

    /// Offer every date in `date_dim` instead of only the selected
    /// station's dates.
    pub global_date_options: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            global_date_options: false,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from `AQI_DASHBOARD_*` environment variables,
    /// falling back to defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("AQI_DASHBOARD_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let database_url = lookup("AQI_DASHBOARD_DATABASE_URL").unwrap_or(defaults.database_url);

        let query_timeout = lookup("AQI_DASHBOARD_QUERY_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.query_timeout);

        let global_date_options = lookup("AQI_DASHBOARD_GLOBAL_DATE_OPTIONS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.global_date_options);

        Self {
            port,
            database_url,
            query_timeout,
            global_date_options,
        }
    }
}
