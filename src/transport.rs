//! The injected transport boundary.
//!
//! The toolkit assembles wire-format requests and hands them to an abstract
//! "send a named operation, get a result or a typed error" capability. The
//! capability is provided by collaborators (an AWS SDK client adapter, a
//! local emulator, a test mock) and is never implemented here. Raw transport
//! failures are normalized into [`crate::error::Error`] at this boundary by
//! the implementor.

use crate::error::Result;

use aws_sdk_dynamodb::types;
use std::collections;

/// Wire-format item map.
pub type WireItem = collections::HashMap<String, types::AttributeValue>;

/// Assembled get-item payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItemRequest {
    /// Whether to read with strong consistency.
    pub consistent_read: Option<bool>,
    /// Name placeholder map for the projection expression.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// The primary key of the requested item.
    pub key: WireItem,
    /// Projection expression limiting the returned attributes.
    pub projection_expression: Option<String>,
    /// The target table.
    pub table_name: String,
}

/// Assembled batch-get payload for one table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItemRequest {
    /// Whether to read with strong consistency.
    pub consistent_read: Option<bool>,
    /// The primary keys of the requested items.
    pub keys: Vec<WireItem>,
    /// The target table.
    pub table_name: String,
}

/// Assembled put-item payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItemRequest {
    /// Condition that must hold for the write to be accepted.
    pub condition_expression: Option<String>,
    /// Name placeholder map shared by the expressions.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder map shared by the expressions.
    pub expression_attribute_values: Option<WireItem>,
    /// The full item to store.
    pub item: WireItem,
    /// The target table.
    pub table_name: String,
}

/// Assembled update-item payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateItemRequest {
    /// Condition that must hold for the update to be accepted.
    pub condition_expression: Option<String>,
    /// Name placeholder map shared by the expressions.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder map shared by the expressions.
    pub expression_attribute_values: Option<WireItem>,
    /// The primary key of the item to update.
    pub key: WireItem,
    /// The target table.
    pub table_name: String,
    /// The compiled update expression.
    pub update_expression: String,
}

/// Assembled delete-item payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItemRequest {
    /// Condition that must hold for the delete to be accepted.
    pub condition_expression: Option<String>,
    /// Name placeholder map for the condition expression.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder map for the condition expression.
    pub expression_attribute_values: Option<WireItem>,
    /// The primary key of the item to delete.
    pub key: WireItem,
    /// The target table.
    pub table_name: String,
}

/// Assembled query payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryRequest {
    /// Whether to read with strong consistency.
    pub consistent_read: Option<bool>,
    /// Pagination cursor from a previous response.
    pub exclusive_start_key: Option<WireItem>,
    /// Name placeholder map shared by the expressions.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// Value placeholder map shared by the expressions.
    pub expression_attribute_values: Option<WireItem>,
    /// Filter applied after the key condition.
    pub filter_expression: Option<String>,
    /// Secondary index to query instead of the base table.
    pub index_name: Option<String>,
    /// The compiled key condition expression.
    pub key_condition_expression: String,
    /// Maximum number of items to evaluate.
    pub limit: Option<i32>,
    /// Projection expression limiting the returned attributes.
    pub projection_expression: Option<String>,
    /// Sort order along the sort key; ascending when unset.
    pub scan_index_forward: Option<bool>,
    /// The target table.
    pub table_name: String,
}

/// A named operation with its assembled input payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// BatchGetItem.
    BatchGetItem(BatchGetItemRequest),
    /// DeleteItem.
    DeleteItem(DeleteItemRequest),
    /// GetItem.
    GetItem(GetItemRequest),
    /// PutItem.
    PutItem(PutItemRequest),
    /// Query.
    Query(QueryRequest),
    /// UpdateItem.
    UpdateItem(UpdateItemRequest),
}

impl Request {
    /// The wire operation name.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::BatchGetItem(_) => "BatchGetItem",
            Self::DeleteItem(_) => "DeleteItem",
            Self::GetItem(_) => "GetItem",
            Self::PutItem(_) => "PutItem",
            Self::Query(_) => "Query",
            Self::UpdateItem(_) => "UpdateItem",
        }
    }
}

/// Capacity consumed by one request, as reported by the service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConsumedCapacity {
    /// Capacity units charged.
    pub capacity_units: f64,
    /// The table they were charged against.
    pub table_name: String,
}

/// Output payload of one operation.
///
/// Mirrors the service outputs: only the fields relevant to the executed
/// operation are populated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
    /// Previous attributes of a written item, when requested.
    pub attributes: Option<WireItem>,
    /// Capacity consumed by the request.
    pub consumed_capacity: Option<ConsumedCapacity>,
    /// The requested item, for single-item reads.
    pub item: Option<WireItem>,
    /// The matched items, for multi-item reads.
    pub items: Option<Vec<WireItem>>,
    /// Pagination cursor when more results remain.
    pub last_evaluated_key: Option<WireItem>,
}

/// Send a named operation with an input payload; receive a result or a typed
/// error from the crate taxonomy.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Execute one assembled request.
    async fn send(&self, request: Request) -> Result<Response>;
}
