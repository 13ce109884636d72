//! Client wiring: configuration, transport, retries and capacity accounting.

use crate::error::{Error, Result};
use crate::{key, metrics, retry, transport};

use indexmap::IndexMap;
use std::sync;

/// Everything the client needs, assembled explicitly by the caller.
///
/// There is no process-global registry: two clients with different
/// configurations coexist without interfering.
///
/// ```rust
/// use dynamodb_intent::client::ClientConfig;
/// use dynamodb_intent::key::{EntityPattern, KeyPattern, KeySpec, Segment};
///
/// let user = EntityPattern::new(KeyPattern {
///     partition: KeySpec {
///         attribute: "pk".to_string(),
///         segments: vec![Segment::literal("USER"), Segment::attribute("user_id")],
///     },
///     sort: Some(KeySpec {
///         attribute: "sk".to_string(),
///         segments: vec![Segment::literal("PROFILE")],
///     }),
/// });
/// let config = ClientConfig::new("app-table").entity("user", user);
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Key patterns per entity type, keyed by entity name.
    pub entities: IndexMap<String, key::EntityPattern>,
    /// Backoff policy applied to retryable failures.
    pub retry_policy: retry::RetryPolicy,
    /// The single table every entity lives in.
    pub table_name: String,
}

impl ClientConfig {
    /// Configuration for `table_name` with no entities and default retries.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            entities: IndexMap::new(),
            retry_policy: retry::RetryPolicy::default(),
            table_name: table_name.into(),
        }
    }

    /// Register the key pattern for one entity type.
    pub fn entity(mut self, name: impl Into<String>, pattern: key::EntityPattern) -> Self {
        self.entities.insert(name.into(), pattern);
        self
    }

    /// Replace the default retry policy.
    pub fn retry_policy(mut self, policy: retry::RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

/// Entry point tying a transport, a configuration, retries and capacity
/// accounting together.
#[derive(Clone)]
pub struct Client {
    config: sync::Arc<ClientConfig>,
    executor: sync::Arc<retry::RetryExecutor>,
    tracker: metrics::CapacityTracker,
    transport: sync::Arc<dyn transport::Transport>,
}

impl Client {
    /// Client over `transport` configured by `config`.
    pub fn new(transport: sync::Arc<dyn transport::Transport>, config: ClientConfig) -> Self {
        let tracker = metrics::CapacityTracker::new();
        let retry_tracker = tracker.clone();
        let executor = retry::RetryExecutor::new(config.retry_policy.clone()).with_observer(
            sync::Arc::new(move |attempt, error, delay| {
                retry_tracker.record_retry();
                tracing::warn!(attempt, %error, ?delay, "retrying request");
            }),
        );
        Self {
            config: sync::Arc::new(config),
            executor: sync::Arc::new(executor),
            tracker,
            transport,
        }
    }

    /// The key pattern registered for `name`.
    pub fn entity(&self, name: &str) -> Result<&key::EntityPattern> {
        self.config
            .entities
            .get(name)
            .ok_or_else(|| Error::UnknownEntity {
                entity: name.to_string(),
            })
    }

    /// The configured table name.
    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Handle to the capacity and outcome totals this client accumulates.
    pub fn tracker(&self) -> metrics::CapacityTracker {
        self.tracker.clone()
    }

    /// Execute `request` with retries, recording capacity and the outcome.
    pub(crate) async fn send(
        &self,
        request: transport::Request,
    ) -> Result<transport::Response> {
        let operation = request.operation_name();
        let result = self
            .executor
            .execute(|| {
                let request = request.clone();
                async move { self.transport.send(request).await }
            })
            .await;
        match &result {
            Ok(response) => {
                self.tracker
                    .record_capacity(response.consumed_capacity.as_ref());
                self.tracker.record_outcome(operation, true);
            }
            Err(error) => {
                self.tracker.record_outcome(operation, false);
                tracing::debug!(operation, %error, "request failed");
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyTransport {
        calls: AtomicU32,
        failures_before_success: u32,
    }

    #[async_trait::async_trait]
    impl transport::Transport for FlakyTransport {
        async fn send(&self, _request: transport::Request) -> Result<transport::Response> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(Error::Throttling {
                    retry_after_ms: None,
                })
            } else {
                Ok(transport::Response {
                    consumed_capacity: Some(transport::ConsumedCapacity {
                        capacity_units: 1.0,
                        table_name: "app-table".to_string(),
                    }),
                    ..Default::default()
                })
            }
        }
    }

    fn get_request() -> transport::Request {
        transport::Request::GetItem(transport::GetItemRequest {
            table_name: "app-table".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let client = Client::new(
            sync::Arc::new(FlakyTransport {
                calls: AtomicU32::new(0),
                failures_before_success: 0,
            }),
            ClientConfig::new("app-table"),
        );
        assert_eq!(
            client.entity("ghost").unwrap_err(),
            Error::UnknownEntity {
                entity: "ghost".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_retries_and_records_totals() {
        let transport = sync::Arc::new(FlakyTransport {
            calls: AtomicU32::new(0),
            failures_before_success: 2,
        });
        let client = Client::new(transport.clone(), ClientConfig::new("app-table"));
        client.send(get_request()).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
        let snapshot = client.tracker().snapshot();
        assert_eq!(snapshot.retries, 2);
        assert_eq!(snapshot.operations["GetItem"].successes, 1);
        assert_eq!(snapshot.capacity_units["app-table"], 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_count_as_failure() {
        let transport = sync::Arc::new(FlakyTransport {
            calls: AtomicU32::new(0),
            failures_before_success: u32::MAX,
        });
        let client = Client::new(transport, ClientConfig::new("app-table"));
        let error = client.send(get_request()).await.unwrap_err();
        assert!(error.is_retryable());
        let snapshot = client.tracker().snapshot();
        assert_eq!(snapshot.retries, 3);
        assert_eq!(snapshot.operations["GetItem"].failures, 1);
    }
}
