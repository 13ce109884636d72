use crate::expression::projection::Projection;

use std::collections;

/// Arguments for single-item read operations (GetItem, BatchGetItem).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SingleReadArgs {
    /// Whether to use a consistent read.
    ///
    /// `true` for strongly consistent reads, `false` or `None` for eventually
    /// consistent reads. Consistent reads consume more capacity units but
    /// guarantee you see the latest data.
    pub consistent_read: Option<bool>,
    /// Which attribute paths to retrieve.
    ///
    /// If `None`, all attributes are retrieved.
    pub projection: Option<Vec<String>>,
}

/// Arguments for multiple-item read operations (Query).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipleReadArgs {
    /// Whether to use a consistent read.
    ///
    /// `true` for strongly consistent reads, `false` or `None` for eventually
    /// consistent reads.
    pub consistent_read: Option<bool>,
    /// The exclusive start key for pagination.
    ///
    /// Typically obtained from the `last_evaluated_key` of the previous
    /// response.
    pub exclusive_start_key: Option<crate::value::Item>,
    /// The maximum number of items to evaluate (not necessarily the number of
    /// matching items).
    pub limit: Option<i32>,
    /// Which attribute paths to retrieve.
    ///
    /// If `None`, all attributes are retrieved.
    pub projection: Option<Vec<String>>,
    /// Whether to traverse the sort key ascending (`true`, the default) or
    /// descending (`false`).
    pub scan_index_forward: Option<bool>,
}

pub(crate) fn compile_projection(
    paths: Option<Vec<String>>,
) -> (
    Option<collections::HashMap<String, String>>,
    Option<String>,
) {
    match paths {
        Some(paths) => {
            let compiled = Projection::new(paths).compile();
            if compiled.is_empty() {
                (None, None)
            } else {
                (Some(compiled.attribute_names), Some(compiled.expression))
            }
        }
        None => (None, None),
    }
}
