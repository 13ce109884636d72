//! Write operations for modifying items in the configured table.
//!
//! This module provides operations for writing data:
//! - Putting new items or replacing existing ones, with derived keys stamped
//! - Updating items with set, remove, add and delete actions
//! - Deleting items by their derived primary key

/// Common utilities and types for write operations.
pub mod common;

/// Delete item operation for removing items from the table.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
