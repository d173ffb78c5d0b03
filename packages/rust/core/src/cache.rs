//! Per-run dedup cache keyed by normalized seed identity.
//!
//! Each key owns one `OnceCell`: the first writer wins, concurrent resolvers
//! of the same key wait on the same in-flight resolution, and nothing is
//! ever overwritten or evicted during a run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

use intelscout_shared::CacheEntry;

#[derive(Debug, Default)]
pub struct DedupCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<CacheEntry>>>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    async fn cell(&self, key: &str) -> Arc<OnceCell<CacheEntry>> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// The stored outcome for `key`, if resolution has completed.
    pub async fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Store an outcome. Returns `false` if `key` already has one.
    pub async fn record(&self, key: &str, entry: CacheEntry) -> bool {
        self.cell(key).await.set(entry).is_ok()
    }

    /// Return the stored outcome, or run `resolve` to produce it.
    ///
    /// The flag is `true` only for the caller whose `resolve` ran.
    pub async fn resolve_with<F, Fut>(&self, key: &str, resolve: F) -> (CacheEntry, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheEntry>,
    {
        let cell = self.cell(key).await;
        let mut ran_here = false;
        let flag = &mut ran_here;
        let entry = cell
            .get_or_init(|| async move {
                *flag = true;
                resolve().await
            })
            .await
            .clone();
        (entry, ran_here)
    }

    /// Number of keys with a stored outcome.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
