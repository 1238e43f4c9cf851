//! # Seeker Shared
//!
//! This crate defines the data structures shared across the seeker indexing
//! pipeline: native field values, search documents, and the field schemas
//! that describe how a document type is laid out in the search engine.

pub mod types;

pub use types::document::{Document, Fields};
pub use types::field_type::{FieldSchema, FieldType, RAW_SUFFIX};
pub use types::value::Value;
