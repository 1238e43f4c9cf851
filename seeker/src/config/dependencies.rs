//! Connection wiring for the indexing pipeline.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use seeker_repository::opensearch::IndexConfig;
use seeker_repository::{Connections, OpenSearchProvider, SearchIndexService};

use super::{ConnectionMode, Settings};
use crate::errors::SeekerError;

/// Open the `default` connection described by `settings`.
///
/// In `Retry` mode this waits until OpenSearch accepts the connection; in
/// `FailFast` mode the first failure is returned.
///
/// # Returns
///
/// * `Ok(Connections)` - A table holding the `default` connection
/// * `Err(SeekerError)` - If the connection fails (only in fail-fast mode)
pub async fn connect(settings: &Settings) -> Result<Connections, SeekerError> {
    info!(
        opensearch_url = %settings.opensearch_url,
        connection_mode = ?settings.connection_mode,
        retry_interval_secs = settings.retry_interval.as_secs(),
        index = %settings.index,
        batch_size = settings.batch_size,
        "Initializing search connection"
    );

    let provider = connect_to_opensearch(
        &settings.opensearch_url,
        settings.index_config.clone(),
        settings.connection_mode,
        settings.retry_interval,
    )
    .await?;

    info!("OpenSearch connection established");

    let service = SearchIndexService::with_config(Box::new(provider), settings.service.clone());
    Ok(Connections::with_default(service))
}

/// Connect to OpenSearch with retry logic based on connection mode.
async fn connect_to_opensearch(
    url: &str,
    index_config: IndexConfig,
    mode: ConnectionMode,
    retry_interval: Duration,
) -> Result<OpenSearchProvider, SeekerError> {
    loop {
        match OpenSearchProvider::new(url, index_config.clone()).await {
            Ok(provider) => return Ok(provider),
            Err(e) => match mode {
                ConnectionMode::FailFast => {
                    return Err(SeekerError::config(format!(
                        "Failed to connect to OpenSearch: {}",
                        e
                    )));
                }
                ConnectionMode::Retry => {
                    warn!(
                        opensearch_url = %url,
                        error = %e,
                        retry_interval_secs = retry_interval.as_secs(),
                        "Failed to connect to OpenSearch, retrying..."
                    );
                    sleep(retry_interval).await;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_fast_on_invalid_url() {
        let settings = Settings {
            opensearch_url: "not a url".to_string(),
            connection_mode: ConnectionMode::FailFast,
            ..Settings::default()
        };

        let result = connect(&settings).await;
        assert!(matches!(result, Err(SeekerError::ConfigError(ref msg)) if msg.contains("OpenSearch")));
    }

    #[tokio::test]
    async fn test_connect_registers_default() {
        let settings = Settings::default();

        // Building the transport does not contact the server.
        let connections = connect(&settings).await.unwrap();
        assert!(connections.get("default").is_ok());
    }
}
