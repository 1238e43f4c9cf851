//! Error types for the seeker repository.
//!
//! This module provides a unified error type for all search transport operations.

mod search_index_error;

pub use search_index_error::SearchIndexError;
