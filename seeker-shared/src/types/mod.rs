//! This module defines the core data structures shared by the seeker crates.
//! It re-exports the value, document and field schema types.

pub mod document;
pub mod field_type;
pub mod value;

pub use document::{Document, Fields};
pub use field_type::{FieldSchema, FieldType};
pub use value::Value;
