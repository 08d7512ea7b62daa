use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

pub const DEFAULT_FEED_URL: &str = "https://raw.githubusercontent.com/1574602830lck-cmd/data-center-monitor/1ae0c6874e16ad216a229cc1451e8dfed81e282d/data_centre_df.csv";

const ENV_FEED_URL: &str = "DCMON_FEED_URL";
const ENV_FEED_TIMEOUT: &str = "DCMON_FEED_TIMEOUT_SECS";
const ENV_FEED_CACHE_TTL: &str = "DCMON_FEED_CACHE_TTL_SECS";
const ENV_RECENT_POINTS: &str = "DCMON_RECENT_POINTS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub feed_url: String,
    pub feed_timeout_secs: u64,
    pub feed_cache_ttl_secs: u64,
    /// Points kept per series on the detail pages.
    pub recent_points: usize,
    /// Points kept per series on the overview previews.
    pub preview_points: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            feed_timeout_secs: 30,
            feed_cache_ttl_secs: 3600,
            recent_points: 12,
            preview_points: 8,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the optional TOML file, then `DCMON_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(ENV_FEED_URL) {
            self.feed_url = url;
        }
        if let Some(raw) = lookup(ENV_FEED_TIMEOUT) {
            self.feed_timeout_secs = parse_number(ENV_FEED_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FEED_CACHE_TTL) {
            self.feed_cache_ttl_secs = parse_number(ENV_FEED_CACHE_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RECENT_POINTS) {
            self.recent_points = parse_number(ENV_RECENT_POINTS, &raw)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.feed_url.trim().is_empty() {
            return Err(DashboardError::Config("feed_url must not be empty".to_string()));
        }
        if self.feed_timeout_secs == 0 {
            return Err(DashboardError::Config(
                "feed_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.recent_points == 0 || self.preview_points == 0 {
            return Err(DashboardError::Config(
                "recent_points and preview_points must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn feed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_cache_ttl_secs)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|err| {
        DashboardError::Config(format!("{name}='{raw}' is not a valid number: {err}"))
    })
}
