//! In-process cache storage
//!
//! Used by tests and by embedders that keep the worker in one process.

use crate::error::SwResult;
use crate::http::{RequestKey, Response};
use crate::store::{ensure_cacheable, Cache, CacheName, CacheStorage};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One in-memory cache
#[derive(Debug)]
pub struct MemoryCache {
    name: CacheName,
    entries: RwLock<HashMap<RequestKey, Response>>,
}

impl MemoryCache {
    fn new(name: CacheName) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn name(&self) -> &CacheName {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> SwResult<Option<Response>> {
        if !key.is_cacheable() {
            return Ok(None);
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &RequestKey, response: &Response) -> SwResult<()> {
        ensure_cacheable(key)?;
        self.entries
            .write()
            .await
            .insert(key.clone(), response.clone());
        Ok(())
    }

    async fn keys(&self) -> SwResult<Vec<RequestKey>> {
        let mut keys: Vec<_> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Cache storage held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    caches: RwLock<BTreeMap<CacheName, Arc<MemoryCache>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, name: &CacheName) -> SwResult<Arc<dyn Cache>> {
        let mut caches = self.caches.write().await;
        let cache = caches
            .entry(name.clone())
            .or_insert_with(|| Arc::new(MemoryCache::new(name.clone())))
            .clone();
        Ok(cache)
    }

    async fn has(&self, name: &CacheName) -> SwResult<bool> {
        Ok(self.caches.read().await.contains_key(name))
    }

    async fn names(&self) -> SwResult<Vec<CacheName>> {
        Ok(self.caches.read().await.keys().cloned().collect())
    }

    async fn delete(&self, name: &CacheName) -> SwResult<bool> {
        Ok(self.caches.write().await.remove(name).is_some())
    }
}
