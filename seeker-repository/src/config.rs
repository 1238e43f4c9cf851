//! Per-connection service configuration.

/// Default maximum number of documents in one bulk request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Limits enforced by a `SearchIndexService` before a request reaches the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIndexServiceConfig {
    /// Maximum number of documents in one bulk upsert or delete. `None`
    /// disables the check.
    pub max_batch_size: Option<usize>,
}

impl Default for SearchIndexServiceConfig {
    fn default() -> Self {
        Self::with_max_batch_size(DEFAULT_MAX_BATCH_SIZE)
    }
}

impl SearchIndexServiceConfig {
    /// No bulk size limit. Large reindex chunks then go out as a single
    /// request, which the cluster may reject or time out on.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }

    /// Config from a numeric setting where `0` means unlimited.
    pub fn from_limit(limit: usize) -> Self {
        match limit {
            0 => Self::unlimited(),
            max => Self::with_max_batch_size(max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_limit() {
        assert_eq!(SearchIndexServiceConfig::from_limit(0).max_batch_size, None);
        assert_eq!(
            SearchIndexServiceConfig::from_limit(250),
            SearchIndexServiceConfig::with_max_batch_size(250)
        );
        assert_eq!(
            SearchIndexServiceConfig::default().max_batch_size,
            Some(DEFAULT_MAX_BATCH_SIZE)
        );
    }
}
