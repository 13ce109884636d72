use std::time;

/// Reason attached to a single item of a cancelled transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CancellationReason {
    /// The item's condition expression evaluated to false.
    ConditionalCheckFailed,
    /// The item collection grew past its size limit.
    ItemCollectionSizeLimitExceeded,
    /// No reason reported for this item.
    None,
    /// The item's table ran out of provisioned throughput.
    ProvisionedThroughputExceeded,
    /// The request was throttled.
    Throttling,
    /// Another transaction conflicted with this item.
    TransactionConflict,
    /// The item failed request validation.
    ValidationError,
}

impl CancellationReason {
    /// Whether retrying the whole transaction could succeed.
    ///
    /// Throughput, throttling, and conflict reasons are transient; everything
    /// else reflects the request itself and will fail again unchanged.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::ProvisionedThroughputExceeded | Self::Throttling | Self::TransactionConflict
        )
    }
}

/// Toolkit error.
///
/// Transport-surfaced variants mirror the DynamoDB error taxonomy one to one
/// and carry the `retry_after` hint when the service suggested one. The
/// remaining variants are client-side programmer errors raised before any
/// request is assembled; none of those are ever retried.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A conditional write was rejected because its condition evaluated to false.
    ///
    /// Carries the expected and actual item versions when the caller was using
    /// version-based optimistic locking and both sides are known.
    #[error("conditional check failed (expected version {expected:?}, actual {actual:?})")]
    ConditionalCheckFailed {
        /// Version the caller expected the item to be at.
        expected: Option<u64>,
        /// Version the item was actually at, when reported.
        actual: Option<u64>,
    },
    /// An attribute path appeared in more than one update clause set.
    #[error("attribute path `{path}` appears in more than one update clause")]
    DuplicateUpdatePath {
        /// The offending attribute path.
        path: String,
    },
    /// An update specification compiled to zero clauses.
    #[error("update specification contains no clauses")]
    EmptyUpdate,
    /// A finalized expression compiler was mutated.
    #[error("expression compiler already finalized")]
    ExpressionFinalized,
    /// A write would have pushed an item collection past its size limit.
    #[error("item collection size limit exceeded")]
    ItemCollectionSizeLimitExceeded,
    /// The requested item does not exist.
    #[error("item not found")]
    ItemNotFound,
    /// The service reported an internal error.
    #[error("internal server error: {message}")]
    InternalServerError {
        /// Message reported by the service.
        message: String,
    },
    /// A key pattern referenced an attribute absent from the item.
    #[error("missing attribute `{attribute}` required by key pattern `{pattern}`")]
    MissingKeyAttribute {
        /// The attribute the pattern requires.
        attribute: String,
        /// Rendered form of the pattern that required it.
        pattern: String,
    },
    /// The table's provisioned throughput was exhausted.
    #[error("provisioned throughput exceeded")]
    ProvisionedThroughputExceeded {
        /// Server-suggested delay before retrying, in milliseconds.
        retry_after_ms: Option<u64>,
    },
    /// The account-level request limit was reached.
    #[error("request limit exceeded")]
    RequestLimitExceeded {
        /// Server-suggested delay before retrying, in milliseconds.
        retry_after_ms: Option<u64>,
    },
    /// The target table or index is being created, updated, or deleted.
    #[error("resource in use: {resource}")]
    ResourceInUse {
        /// Name of the busy resource.
        resource: String,
    },
    /// The target table or index does not exist.
    #[error("resource not found: {resource}")]
    ResourceNotFound {
        /// Name of the missing resource.
        resource: String,
    },
    /// A value could not be lowered into its wire representation.
    #[error("serialization failed: {message}")]
    Serialization {
        /// What the serializer reported.
        message: String,
    },
    /// The service is temporarily unavailable.
    #[error("service unavailable")]
    ServiceUnavailable {
        /// Server-suggested delay before retrying, in milliseconds.
        retry_after_ms: Option<u64>,
    },
    /// The request was throttled.
    #[error("request throttled")]
    Throttling {
        /// Server-suggested delay before retrying, in milliseconds.
        retry_after_ms: Option<u64>,
    },
    /// A transaction was cancelled, one reason per transaction item.
    #[error("transaction cancelled ({} items)", reasons.len())]
    TransactionCancelled {
        /// One cancellation reason per transaction item, in request order.
        reasons: Vec<CancellationReason>,
    },
    /// An operation referenced an entity type missing from the configuration.
    #[error("unknown entity type `{entity}`")]
    UnknownEntity {
        /// The entity type name that was looked up.
        entity: String,
    },
    /// A key pattern referenced an attribute whose value kind cannot form a key.
    #[error("attribute `{attribute}` of kind {kind} cannot be used in a key")]
    UnsupportedKeyAttribute {
        /// The attribute the pattern referenced.
        attribute: String,
        /// Wire type descriptor of the unusable value.
        kind: &'static str,
    },
    /// The request failed validation before execution.
    #[error("validation error: {message}")]
    Validation {
        /// Overall validation message.
        message: String,
        /// Per-field messages, when the service itemized them.
        fields: Vec<(String, String)>,
    },
}

impl Error {
    /// Whether a retry of the same request could succeed.
    ///
    /// Exactly the transient transport kinds qualify. A cancelled transaction
    /// is retryable iff any of its per-item reasons is transient. Client-side
    /// errors are programmer errors and never retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InternalServerError { .. }
            | Self::ProvisionedThroughputExceeded { .. }
            | Self::RequestLimitExceeded { .. }
            | Self::ServiceUnavailable { .. }
            | Self::Throttling { .. } => true,
            Self::TransactionCancelled { reasons } => {
                reasons.iter().any(|reason| reason.is_transient())
            }
            _ => false,
        }
    }

    /// Server-suggested delay before retrying, when one was attached.
    pub fn retry_after(&self) -> Option<time::Duration> {
        match self {
            Self::ProvisionedThroughputExceeded { retry_after_ms }
            | Self::RequestLimitExceeded { retry_after_ms }
            | Self::ServiceUnavailable { retry_after_ms }
            | Self::Throttling { retry_after_ms } => {
                retry_after_ms.map(time::Duration::from_millis)
            }
            _ => None,
        }
    }
}

impl From<serde_dynamo::Error> for Error {
    fn from(error: serde_dynamo::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::throttling(Error::Throttling { retry_after_ms: None }, true)]
    #[case::throughput(
        Error::ProvisionedThroughputExceeded { retry_after_ms: Some(50) },
        true
    )]
    #[case::internal(Error::InternalServerError { message: "boom".to_string() }, true)]
    #[case::unavailable(Error::ServiceUnavailable { retry_after_ms: None }, true)]
    #[case::request_limit(Error::RequestLimitExceeded { retry_after_ms: None }, true)]
    #[case::conditional_check(
        Error::ConditionalCheckFailed { expected: Some(1), actual: Some(2) },
        false
    )]
    #[case::validation(
        Error::Validation { message: "bad".to_string(), fields: Vec::new() },
        false
    )]
    #[case::resource_not_found(
        Error::ResourceNotFound { resource: "users".to_string() },
        false
    )]
    #[case::item_collection(Error::ItemCollectionSizeLimitExceeded, false)]
    #[case::missing_key(
        Error::MissingKeyAttribute {
            attribute: "id".to_string(),
            pattern: "USER#{id}".to_string(),
        },
        false
    )]
    #[case::empty_update(Error::EmptyUpdate, false)]
    fn test_retryable_classification(#[case] error: Error, #[case] expected: bool) {
        assert_eq!(error.is_retryable(), expected);
    }

    #[rstest]
    #[case::conflict(vec![CancellationReason::None, CancellationReason::TransactionConflict], true)]
    #[case::throttling(vec![CancellationReason::Throttling], true)]
    #[case::throughput(vec![CancellationReason::ProvisionedThroughputExceeded], true)]
    #[case::conditional_only(vec![CancellationReason::ConditionalCheckFailed], false)]
    #[case::validation_only(
        vec![CancellationReason::ValidationError, CancellationReason::None],
        false
    )]
    #[case::empty(Vec::new(), false)]
    fn test_transaction_cancelled_retryable(
        #[case] reasons: Vec<CancellationReason>,
        #[case] expected: bool,
    ) {
        let error = Error::TransactionCancelled { reasons };
        assert_eq!(error.is_retryable(), expected);
    }

    #[rstest]
    #[case::hint(
        Error::Throttling { retry_after_ms: Some(250) },
        Some(time::Duration::from_millis(250))
    )]
    #[case::no_hint(Error::Throttling { retry_after_ms: None }, None)]
    #[case::fatal_never_hints(
        Error::ConditionalCheckFailed { expected: None, actual: None },
        None
    )]
    fn test_retry_after(#[case] error: Error, #[case] expected: Option<time::Duration>) {
        assert_eq!(error.retry_after(), expected);
    }
}
