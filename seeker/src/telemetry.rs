//! Tracing initialisation.

use std::env;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::SeekerError;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "seeker=info,seeker_repository=info";

/// Install the global tracing subscriber.
///
/// Uses JSON output when `SEEKER_LOG_JSON` is set, pretty console output
/// otherwise. Fails if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), SeekerError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if env::var("SEEKER_LOG_JSON").is_ok() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| SeekerError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "seeker",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| SeekerError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "seeker",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}
