//! Configuration for reconciliation runs.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use hikingtime::COMB;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("MAX_CONCURRENT_REQUESTS must be at least 1")]
    ZeroConcurrency,
}

/// Fixed query parameters sent with every profile request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileQuery {
    /// Elevation model(s) the service should sample.
    pub elevation_models: String,
    /// EPSG code of the submitted geometry (2056 = LV95).
    pub projection: u32,
    /// Smoothing offset; 0 disables smoothing.
    pub offset: u32,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self {
            elevation_models: COMB.to_string(),
            projection: 2056,
            offset: 0,
        }
    }
}

impl ProfileQuery {
    pub fn as_params(&self) -> [(&'static str, String); 3] {
        [
            ("elevation_models", self.elevation_models.clone()),
            ("projection", self.projection.to_string()),
            ("offset", self.offset.to_string()),
        ]
    }
}

/// Settings for a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Base URL of the profile service currently in production.
    pub before_base_url: String,

    /// Base URL of the profile service being validated.
    pub after_base_url: String,

    /// Folder holding the metadata file and the per-trail GeoJSON files.
    pub data_dir: PathBuf,

    /// Name of the metadata file inside `data_dir`.
    pub metadata_file: String,

    /// Where the JSON report is written.
    pub report_path: PathBuf,

    /// Number of trails processed at once. 1 keeps a single request in flight.
    pub max_concurrent_requests: usize,

    /// Only process the first N trails (shortens development runs).
    pub max_trails: Option<usize>,

    /// Timeout for a single profile request.
    pub request_timeout_secs: u64,

    /// `Referer` header sent to the profile service.
    pub referer: String,

    pub query: ProfileQuery,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            before_base_url: "http://service-alti.int.bgdi.ch".to_string(),
            after_base_url: "http://service-alti.int.bgdi.ch/ltbtp_profile_cleanup".to_string(),
            data_dir: PathBuf::from(
                "/var/local/geodata/bund/swisstopo/swissalti3d/hikingtime_analysis/",
            ),
            metadata_file: "metadata.json".to_string(),
            report_path: PathBuf::from("hikingtime_report.json"),
            max_concurrent_requests: 1,
            max_trails: None,
            request_timeout_secs: 30,
            referer: "http://service-alti.int.bgdi.ch/".to_string(),
            query: ProfileQuery::default(),
        }
    }
}

impl ReconcileConfig {
    /// Builds the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("BEFORE_BASE_URL") {
            config.before_base_url = url;
        }
        if let Some(url) = lookup("AFTER_BASE_URL") {
            config.after_base_url = url;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("METADATA_FILE") {
            config.metadata_file = file;
        }
        if let Some(path) = lookup("REPORT_PATH") {
            config.report_path = PathBuf::from(path);
        }
        if let Some(referer) = lookup("PROFILE_REFERER") {
            config.referer = referer;
        }
        if let Some(value) = lookup("MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests = parse("MAX_CONCURRENT_REQUESTS", value)?;
        }
        if let Some(value) = lookup("MAX_TRAILS") {
            config.max_trails = Some(parse("MAX_TRAILS", value)?);
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse("REQUEST_TIMEOUT_SECS", value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}
