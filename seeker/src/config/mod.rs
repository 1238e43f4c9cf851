//! Process-wide settings and connection wiring.

mod dependencies;

pub use dependencies::connect;

use std::env;
use std::time::Duration;
use tracing::warn;

use seeker_repository::opensearch::IndexConfig;
use seeker_repository::SearchIndexServiceConfig;

use crate::errors::SeekerError;

/// Default index name for document mappings.
pub const DEFAULT_INDEX: &str = "seeker";

/// Default number of records fetched per enumeration window.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection at the configured interval until successful.
    #[default]
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive). Anything else
    /// falls back to `Retry`.
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Settings consumed when mappings are declared and connections are opened.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Index used by mappings that do not name one.
    pub index: String,
    /// Enumeration window size used by mappings that do not set one.
    pub batch_size: usize,
    pub opensearch_url: String,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    /// Limits applied by the `default` connection's service.
    pub service: SearchIndexServiceConfig,
    /// Settings for physical indices created by `put_mapping`.
    pub index_config: IndexConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            opensearch_url: DEFAULT_OPENSEARCH_URL.to_string(),
            connection_mode: ConnectionMode::default(),
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            service: SearchIndexServiceConfig::default(),
            index_config: IndexConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from the environment, reading `.env` first.
    ///
    /// # Environment Variables
    ///
    /// - `SEEKER_INDEX`: Default index name (default: "seeker")
    /// - `SEEKER_BATCH_SIZE`: Enumeration window size, must be > 0 (default: 1000)
    /// - `SEEKER_MAX_BULK_SIZE`: Maximum documents per bulk request, 0 for no limit (default: 1000)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `OPENSEARCH_SHARDS` / `OPENSEARCH_REPLICAS`: Settings for created indices (default: 1 / 1)
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - Loaded settings
    /// * `Err(SeekerError)` - If a numeric variable does not parse or the batch size is zero
    pub fn from_env() -> Result<Self, SeekerError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SeekerError> {
        let defaults = Self::default();

        let batch_size = parse_var(&lookup, "SEEKER_BATCH_SIZE")?.unwrap_or(defaults.batch_size);
        if batch_size == 0 {
            return Err(SeekerError::InvalidBatchSize);
        }

        let service = parse_var(&lookup, "SEEKER_MAX_BULK_SIZE")?
            .map(SearchIndexServiceConfig::from_limit)
            .unwrap_or(defaults.service);

        let index_config = IndexConfig::new(
            parse_var(&lookup, "OPENSEARCH_SHARDS")?
                .unwrap_or(defaults.index_config.number_of_shards),
            parse_var(&lookup, "OPENSEARCH_REPLICAS")?
                .unwrap_or(defaults.index_config.number_of_replicas),
        );

        Ok(Self {
            index: lookup("SEEKER_INDEX").unwrap_or(defaults.index),
            batch_size,
            opensearch_url: lookup("OPENSEARCH_URL").unwrap_or(defaults.opensearch_url),
            connection_mode: lookup("OPENSEARCH_CONNECTION_MODE")
                .map(|mode| ConnectionMode::parse(&mode))
                .unwrap_or(defaults.connection_mode),
            retry_interval: parse_var(&lookup, "OPENSEARCH_RETRY_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_interval),
            service,
            index_config,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, SeekerError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| SeekerError::config(format!("{} must be a number, got '{}'", key, raw))),
    }
}
