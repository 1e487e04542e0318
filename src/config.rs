use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::data::model::TimeRange;

/// Base URL of the USGS summary feeds.
pub const DEFAULT_FEED_URL: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENV_FEED_URL: &str = "QUAKEWATCH_FEED_URL";
pub const ENV_FEED_DIR: &str = "QUAKEWATCH_FEED_DIR";
pub const ENV_TIMEOUT_SECS: &str = "QUAKEWATCH_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive number of seconds, got {value:?}")]
    InvalidTimeout { var: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Feed configuration
// ---------------------------------------------------------------------------

/// Where feed documents come from.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Base URL; the endpoint for a range is `<base>/all_<range>.geojson`.
    pub base_url: String,
    /// When set, feed files are read from this directory instead.
    pub local_dir: Option<PathBuf>,
    /// HTTP request timeout.
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            local_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FeedConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = FeedConfig::default();

        if let Some(url) = get(ENV_FEED_URL) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        config.local_dir = get(ENV_FEED_DIR).map(PathBuf::from);
        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout {
                    var: ENV_TIMEOUT_SECS,
                    value: raw,
                })?;
        }
        Ok(config)
    }

    /// Feed document name for a time range, e.g. `all_day.geojson`.
    pub fn file_name(range: TimeRange) -> String {
        format!("all_{}.geojson", range.key())
    }

    /// HTTP endpoint for a time range.
    pub fn endpoint(&self, range: TimeRange) -> String {
        format!("{}/{}", self.base_url, Self::file_name(range))
    }
}
