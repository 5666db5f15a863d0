use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

/// Memoizes the result of an async lookup per key.
///
/// Meant to live for a single logical operation: concurrent callers asking
/// for the same key share one in-flight fetch, and failures are memoized
/// alongside successes.
pub struct Memo<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    inner: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = {
            let mut cells = self.inner.lock().await;
            if cells.contains_key(&key) {
                debug!("Memo HIT for key: {:?}", key);
            } else {
                debug!("Memo MISS for key: {:?}", key);
            }
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_init(fetch).await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl<K, V> Default for Memo<K, V>
where
    K: Eq + Hash + Send + Sync + std::fmt::Debug,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}
