//! Named search connections.
//!
//! Document mappings refer to their search cluster by a connection identifier
//! (`"default"` unless declared otherwise). `Connections` resolves that
//! identifier to a `SearchIndexService`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::SearchIndexError;
use crate::service::SearchIndexService;

/// Identifier used when a mapping does not name a connection.
pub const DEFAULT_CONNECTION: &str = "default";

/// Connection identifier → search service table.
#[derive(Clone, Default)]
pub struct Connections {
    services: HashMap<String, Arc<SearchIndexService>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with a single `default` connection.
    pub fn with_default(service: SearchIndexService) -> Self {
        let mut connections = Self::new();
        connections.add(DEFAULT_CONNECTION, service);
        connections
    }

    /// Register a connection, replacing any previous one with the same alias.
    pub fn add(&mut self, alias: impl Into<String>, service: SearchIndexService) {
        self.services.insert(alias.into(), Arc::new(service));
    }

    /// Look up a connection by alias.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<SearchIndexService>)` - The registered service
    /// * `Err(SearchIndexError::UnknownConnection)` - If nothing is registered under `alias`
    pub fn get(&self, alias: &str) -> Result<Arc<SearchIndexService>, SearchIndexError> {
        self.services
            .get(alias)
            .cloned()
            .ok_or_else(|| SearchIndexError::unknown_connection(alias))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for Connections {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connections")
            .field("aliases", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}
