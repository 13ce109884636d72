//! Read operations for retrieving items from the configured table.
//!
//! This module provides operations for reading data:
//! - Getting individual items by their derived primary key
//! - Querying an entity's partition with key conditions and filters
//! - Batch retrieving multiple items in one request

/// Batch get item operation for retrieving multiple items efficiently.
pub mod batch_get_item;

/// Common argument types shared by read operations.
pub mod common;

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// Query operation for retrieving items with key conditions.
pub mod query;
