//! Error types for the seeker indexing pipeline.

use thiserror::Error;

use seeker_repository::SearchIndexError;

/// Errors raised by the relational source collaborator.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    /// The source failed to run a query.
    #[error("Query error: {0}")]
    QueryError(String),

    /// The selection cannot stream through a server-side cursor.
    #[error("Server-side cursors are not supported by this selection")]
    CursorUnsupported,

    /// The entity type declares no field with this name.
    #[error("{entity} has no field named {field}")]
    UnknownField { entity: String, field: String },
}

impl SourceError {
    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create an unknown field error.
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }
}

/// Errors that can occur while declaring, enumerating or indexing documents.
#[derive(Error, Debug)]
pub enum SeekerError {
    /// Error from the relational source.
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// Error from the search transport.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// A previously indexed record no longer exists.
    #[error("{doc_type} document {id} not found")]
    NotFound { doc_type: String, id: String },

    /// The mapping has no backing entity type to select records from.
    #[error("Document type {0} is not backed by an entity type")]
    Unbound(String),

    /// Batch size must be positive.
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SeekerError {
    /// Create a not found error.
    pub fn not_found(doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Errors raised while registering document mappings.
///
/// These are programming errors caught at start-up, not runtime conditions,
/// and should be propagated rather than retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The owning application is not installed.
    #[error("Application {0} is not installed")]
    AppNotInstalled(String),

    /// The mapping cannot be registered as declared.
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),
}

impl RegistrationError {
    /// Create an invalid mapping error.
    pub fn invalid_mapping(msg: impl Into<String>) -> Self {
        Self::InvalidMapping(msg.into())
    }
}
