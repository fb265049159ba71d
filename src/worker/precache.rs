//! Install-time precache
//!
//! Every manifest URL is fetched before the cache store is touched. A
//! single failed or non-OK fetch aborts the install with no store
//! created; a failed write deletes the partially filled store.

use crate::error::{SwError, SwResult};
use crate::http::Request;
use crate::network::Fetcher;
use crate::store::{CacheName, CacheStorage};
use futures_util::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Populates a versioned cache with the precache manifest
pub struct Precacher {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
}

impl Precacher {
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { storage, fetcher }
    }

    /// Fetch and store every manifest URL, all or nothing.
    /// Returns the number of entries stored.
    pub async fn run(&self, cache_name: &CacheName, manifest: &[Url]) -> SwResult<usize> {
        let fetches = manifest.iter().map(|url| {
            let request = Request::get(url.clone());
            async move {
                let response = self.fetcher.fetch(&request).await.map_err(|e| {
                    SwError::PrecacheFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                if !response.ok() {
                    return Err(SwError::PrecacheFailed {
                        url: url.to_string(),
                        reason: format!("status {}", response.status),
                    });
                }
                debug!(url = %url, bytes = response.body.len(), "precache fetched");
                Ok((request.key(), response))
            }
        });

        let fetched = try_join_all(fetches).await?;

        let cache = self.storage.open(cache_name).await?;
        for (key, response) in &fetched {
            if let Err(e) = cache.put(key, response).await {
                warn!("Precache write for {} failed, discarding {}", key, cache.name());
                if let Err(cleanup) = self.storage.delete(cache_name).await {
                    warn!("Could not discard {}: {}", cache_name, cleanup);
                }
                return Err(e);
            }
        }

        info!("Precached {} entries into {}", fetched.len(), cache_name);
        Ok(fetched.len())
    }
}
