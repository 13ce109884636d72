//! Batching of fine-grained key lookups within a small time window.

use crate::error::{Error, Result};

use std::hash::Hash;
use std::{collections, sync, time};
use tokio::sync::{Mutex, oneshot};

/// Injected batch lookup: resolves a set of keys to a key-to-result map in
/// one call. Keys absent from the returned map are treated as not found.
#[async_trait::async_trait]
pub trait BatchLoader<K, V>: Send + Sync {
    /// Load every requested key at once.
    async fn load(&self, keys: Vec<K>) -> Result<collections::HashMap<K, V>>;
}

struct PendingBatch<K, V> {
    entries: Vec<(K, oneshot::Sender<Result<V>>)>,
    // bumped on every flush so a stale window timer does not flush twice
    generation: u64,
}

impl<K, V> PendingBatch<K, V> {
    fn take(&mut self) -> Vec<(K, oneshot::Sender<Result<V>>)> {
        self.generation += 1;
        std::mem::take(&mut self.entries)
    }
}

/// Collects individual key lookups into one batched call.
///
/// A batch executes when the window timer elapses or the batch reaches its
/// maximum size, whichever comes first. Every waiter resolves to the entry
/// for the key it submitted, never to another key's result from the same
/// batch; a key the loader did not return resolves to
/// [`Error::ItemNotFound`], and a loader failure fans out to every waiter of
/// that batch.
pub struct Coalescer<K, V> {
    loader: sync::Arc<dyn BatchLoader<K, V>>,
    max_batch_size: usize,
    pending: sync::Arc<Mutex<PendingBatch<K, V>>>,
    window: time::Duration,
}

impl<K, V> Coalescer<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Coalescer flushing after `window` or at `max_batch_size` entries.
    pub fn new(
        window: time::Duration,
        max_batch_size: usize,
        loader: sync::Arc<dyn BatchLoader<K, V>>,
    ) -> Self {
        Self {
            loader,
            max_batch_size: max_batch_size.max(1),
            pending: sync::Arc::new(Mutex::new(PendingBatch {
                entries: Vec::new(),
                generation: 0,
            })),
            window,
        }
    }

    /// Look up one key through the current batch.
    pub async fn lookup(&self, key: K) -> Result<V> {
        let (sender, receiver) = oneshot::channel();
        let full_batch = {
            let mut pending = self.pending.lock().await;
            pending.entries.push((key, sender));
            if pending.entries.len() >= self.max_batch_size {
                Some(pending.take())
            } else {
                if pending.entries.len() == 1 {
                    // first entry of a fresh batch arms the window timer
                    self.arm_window_timer(pending.generation);
                }
                None
            }
        };
        if let Some(entries) = full_batch {
            Self::flush(sync::Arc::clone(&self.loader), entries).await;
        }
        receiver.await.unwrap_or_else(|_| {
            Err(Error::InternalServerError {
                message: "coalesced lookup dropped before completion".to_string(),
            })
        })
    }

    fn arm_window_timer(&self, generation: u64) {
        let loader = sync::Arc::clone(&self.loader);
        let pending = sync::Arc::clone(&self.pending);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let entries = {
                let mut pending = pending.lock().await;
                if pending.generation != generation {
                    // already flushed by the size threshold
                    return;
                }
                pending.take()
            };
            Self::flush(loader, entries).await;
        });
    }

    async fn flush(
        loader: sync::Arc<dyn BatchLoader<K, V>>,
        entries: Vec<(K, oneshot::Sender<Result<V>>)>,
    ) {
        if entries.is_empty() {
            return;
        }
        let mut keys = Vec::with_capacity(entries.len());
        let mut seen = collections::HashSet::with_capacity(entries.len());
        for (key, _) in &entries {
            if seen.insert(key.clone()) {
                keys.push(key.clone());
            }
        }
        tracing::debug!(batch_size = keys.len(), "flushing coalesced batch");
        match loader.load(keys).await {
            Ok(results) => {
                for (key, sender) in entries {
                    let result = results.get(&key).cloned().ok_or(Error::ItemNotFound);
                    let _ = sender.send(result);
                }
            }
            Err(error) => {
                for (_, sender) in entries {
                    let _ = sender.send(Err(error.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    struct MapLoader {
        calls: AtomicU32,
        results: collections::HashMap<String, u64>,
    }

    impl MapLoader {
        fn new(results: collections::HashMap<String, u64>) -> sync::Arc<Self> {
            sync::Arc::new(Self {
                calls: AtomicU32::new(0),
                results,
            })
        }
    }

    #[async_trait::async_trait]
    impl BatchLoader<String, u64> for MapLoader {
        async fn load(&self, keys: Vec<String>) -> Result<collections::HashMap<String, u64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(keys
                .into_iter()
                .filter_map(|key| self.results.get(&key).map(|value| (key, *value)))
                .collect())
        }
    }

    struct FailingLoader;

    #[async_trait::async_trait]
    impl BatchLoader<String, u64> for FailingLoader {
        async fn load(&self, _keys: Vec<String>) -> Result<collections::HashMap<String, u64>> {
            Err(Error::ServiceUnavailable {
                retry_after_ms: None,
            })
        }
    }

    #[tokio::test]
    async fn test_each_waiter_gets_its_own_keys_result() {
        let loader = MapLoader::new(collections::HashMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 2),
        ]));
        let coalescer = Coalescer::new(time::Duration::from_millis(5), 2, loader.clone());
        let (a, b) = tokio::join!(
            coalescer.lookup("a".to_string()),
            coalescer.lookup("b".to_string()),
        );
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_size_threshold_flushes_before_window() {
        let loader = MapLoader::new(collections::HashMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("c".to_string(), 3),
        ]));
        // window long enough that only the size threshold can flush in time
        let coalescer = Coalescer::new(time::Duration::from_secs(60), 3, loader.clone());
        let (a, b, c) = tokio::join!(
            coalescer.lookup("a".to_string()),
            coalescer.lookup("b".to_string()),
            coalescer.lookup("c".to_string()),
        );
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(c.unwrap(), 3);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_window_flushes_a_partial_batch() {
        let loader = MapLoader::new(collections::HashMap::from([("a".to_string(), 1)]));
        let coalescer = Coalescer::new(time::Duration::from_millis(5), 100, loader.clone());
        let value = coalescer.lookup("a".to_string()).await.unwrap();
        assert_eq!(value, 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_absent_key_resolves_to_item_not_found() {
        let loader = MapLoader::new(collections::HashMap::from([("a".to_string(), 1)]));
        let coalescer = Coalescer::new(time::Duration::from_millis(5), 2, loader);
        let (a, missing) = tokio::join!(
            coalescer.lookup("a".to_string()),
            coalescer.lookup("missing".to_string()),
        );
        assert_eq!(a.unwrap(), 1);
        assert_eq!(missing.unwrap_err(), Error::ItemNotFound);
    }

    #[tokio::test]
    async fn test_loader_failure_fans_out_to_every_waiter() {
        let coalescer = Coalescer::new(
            time::Duration::from_millis(5),
            2,
            sync::Arc::new(FailingLoader),
        );
        let (a, b) = tokio::join!(
            coalescer.lookup("a".to_string()),
            coalescer.lookup("b".to_string()),
        );
        let expected = Error::ServiceUnavailable {
            retry_after_ms: None,
        };
        assert_eq!(a.unwrap_err(), expected);
        assert_eq!(b.unwrap_err(), expected);
    }

    #[tokio::test]
    async fn test_duplicate_keys_share_one_slot_in_the_batch() {
        let loader = MapLoader::new(collections::HashMap::from([("a".to_string(), 1)]));
        let coalescer = Coalescer::new(time::Duration::from_millis(5), 2, loader.clone());
        let (first, second) = tokio::join!(
            coalescer.lookup("a".to_string()),
            coalescer.lookup("a".to_string()),
        );
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }
}
