//! # Seeker
//!
//! Indexing pipeline that keeps search documents derived from relational
//! records.
//!
//! ## Architecture
//!
//! 1. **Source**: the relational collaborator (entity types, records, selections)
//! 2. **Resolve / Schema**: path resolution and default schema derivation
//! 3. **Mapping**: document type declarations and the `Indexable` contract
//! 4. **Registry**: which document types exist and which entity backs each
//! 5. **Loader**: bulk reindexing and per-record synchronization
//!
//! ## Modules
//!
//! - [`config`]: Settings and connection wiring
//! - [`source`]: Relational source traits and an in-memory source
//! - [`resolve`]: `__` path resolution with to-many fan-out
//! - [`schema`]: Default field schemas for entity types
//! - [`mapping`]: `DocumentMapping` and `Indexable`
//! - [`registry`]: Registry of declared mappings
//! - [`loader`]: `Reindexer`
//! - [`telemetry`]: Tracing initialisation
//! - [`errors`]: Error types

pub mod config;
pub mod errors;
pub mod loader;
pub mod mapping;
pub mod registry;
pub mod resolve;
pub mod schema;
pub mod source;
pub mod telemetry;

pub use config::Settings;
pub use errors::{RegistrationError, SeekerError, SourceError};
pub use loader::{ReindexSummary, Reindexer};
pub use mapping::{DocumentMapping, Enumeration, Indexable, IndexableRef};
pub use registry::{AppConfig, Registry};
pub use resolve::resolve;
pub use schema::{build_schema, document_field, SchemaBuilder};
