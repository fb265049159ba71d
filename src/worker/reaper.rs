//! Activation-time removal of superseded caches

use crate::error::SwResult;
use crate::store::{CacheName, CacheStorage};
use std::sync::Arc;
use tracing::info;

/// Deletes every cache except the current version
pub struct Reaper {
    storage: Arc<dyn CacheStorage>,
}

impl Reaper {
    pub fn new(storage: Arc<dyn CacheStorage>) -> Self {
        Self { storage }
    }

    /// Delete all caches not named `current`; returns the deleted names
    pub async fn run(&self, current: &CacheName) -> SwResult<Vec<CacheName>> {
        let mut deleted = Vec::new();

        for name in self.storage.names().await? {
            if &name == current {
                continue;
            }
            if self.storage.delete(&name).await? {
                info!("Deleted stale cache {}", name);
                deleted.push(name);
            }
        }

        Ok(deleted)
    }
}
