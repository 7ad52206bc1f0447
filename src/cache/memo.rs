//! Process-lifetime memoization of async loads.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};

type SharedLoad<V> = Shared<BoxFuture<'static, Arc<V>>>;

/// Memoizes the result of an async loader per key.
///
/// The loader's future is stored before anyone awaits it, so callers that
/// race on the same key all await the one shared load. Completed values
/// stay cached until [`MemoCache::clear`].
pub struct MemoCache<K, V> {
    entries: Mutex<HashMap<K, SharedLoad<V>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash,
    V: Send + Sync + 'static,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value for `key`, running `loader` only if no load for
    /// it is cached or in flight.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, loader: F) -> Arc<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let load = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries
                .entry(key)
                .or_insert_with(|| loader().map(Arc::new).boxed().shared())
                .clone()
        };
        load.await
    }

    /// Drops every cached and in-flight entry.
    ///
    /// Callers already awaiting a dropped load still receive its value.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for MemoCache<K, V>
where
    K: Eq + Hash,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .entries
            .lock()
            .map_or_else(|poisoned| poisoned.into_inner().len(), |e| e.len());
        f.debug_struct("MemoCache").field("entries", &len).finish()
    }
}
