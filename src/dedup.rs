//! Collapsing of concurrent identical in-flight requests.

use crate::error::{Error, Result};

use std::{collections, sync};
use tokio::sync::{Mutex, broadcast};

/// At most one concurrently in-flight operation per key.
///
/// The first caller for a key runs the operation; callers arriving while it
/// is in flight await the same result. The operation runs on its own task, so
/// a waiter giving up cannot abort it out from under the others. Completion
/// (success or failure) removes the key, so a later call starts fresh.
///
/// The in-flight map is the only shared state and sits behind a mutex, which
/// keeps the component safe on multi-threaded hosts.
///
/// ```rust
/// use dynamodb_intent::dedup;
///
/// # async fn example() {
/// let deduplicator: dedup::Deduplicator<u64> = dedup::Deduplicator::new();
/// let value = deduplicator
///     .execute("user#42", || async { Ok(7) })
///     .await
///     .unwrap();
/// assert_eq!(value, 7);
/// # }
/// ```
pub struct Deduplicator<T> {
    in_flight: sync::Arc<Mutex<collections::HashMap<String, broadcast::Sender<Result<T>>>>>,
}

impl<T> Default for Deduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deduplicator<T> {
    /// Deduplicator with an empty in-flight map.
    pub fn new() -> Self {
        Self {
            in_flight: sync::Arc::new(Mutex::new(collections::HashMap::new())),
        }
    }
}

impl<T: Clone + Send + 'static> Deduplicator<T> {
    /// Run `operation` under `key`, or join the in-flight run for that key.
    pub async fn execute<F, Fut>(&self, key: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut receiver = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(key) {
                Some(sender) => {
                    tracing::debug!(key, "joining in-flight request");
                    sender.subscribe()
                }
                None => {
                    let (sender, receiver) = broadcast::channel(1);
                    in_flight.insert(key.to_string(), sender.clone());
                    let map = sync::Arc::clone(&self.in_flight);
                    let key = key.to_string();
                    let future = operation();
                    tokio::spawn(async move {
                        let result = future.await;
                        let mut in_flight = map.lock().await;
                        in_flight.remove(&key);
                        let _ = sender.send(result);
                    });
                    receiver
                }
            }
        };
        receiver.recv().await.unwrap_or_else(|_| {
            Err(Error::InternalServerError {
                message: "deduplicated operation dropped before completion".to_string(),
            })
        })
    }
}
