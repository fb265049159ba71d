//! Per-request caching strategies
//!
//! | Class | Strategy | On hit | On miss |
//! |-------|----------|--------|---------|
//! | static asset | cache-first | cached | fetch, store if 200/basic |
//! | font file | cache-first | cached, never revalidated | fetch, store |
//! | font stylesheet | stale-while-revalidate | cached + background refresh | fetch, store |
//! | navigation | network-first | - | offline document on network error |
//! | other | network-only | - | - |
//!
//! Cache store failures never fail a request: lookups degrade to a miss
//! and writes are skipped. Network failures surface unchanged except for
//! navigations, which fall back to the precached offline document.

use crate::error::{SwError, SwResult};
use crate::http::{Request, RequestKey, Response, ResponseType};
use crate::network::Fetcher;
use crate::store::{Cache, CacheName, CacheStorage};
use crate::worker::classify::{FontOrigin, RequestClass};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Strategy applied to a request class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    CacheFirst,
    CacheFirstImmutable,
    StaleWhileRevalidate,
    NetworkFirst,
    NetworkOnly,
}

impl From<RequestClass> for Strategy {
    fn from(class: RequestClass) -> Self {
        match class {
            RequestClass::StaticAsset => Self::CacheFirst,
            RequestClass::FontProvider(FontOrigin::Binary) => Self::CacheFirstImmutable,
            RequestClass::FontProvider(FontOrigin::Stylesheet) => Self::StaleWhileRevalidate,
            RequestClass::Navigation => Self::NetworkFirst,
            RequestClass::Other => Self::NetworkOnly,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CacheFirst => "cache-first",
            Self::CacheFirstImmutable => "cache-first (immutable)",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
            Self::NetworkFirst => "network-first",
            Self::NetworkOnly => "network-only",
        };
        write!(f, "{}", name)
    }
}

/// Where a returned response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
    Fallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
            Self::Fallback => write!(f, "offline fallback"),
        }
    }
}

/// Detached background refresh started by stale-while-revalidate
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<()>,
}

impl Revalidation {
    /// Wait for the refresh to finish. Failures were already logged.
    pub async fn settled(self) {
        if let Err(e) = self.handle.await {
            warn!("Revalidation task aborted: {}", e);
        }
    }
}

/// Outcome of routing one request
#[derive(Debug)]
pub struct Handled {
    pub response: Response,
    pub source: ResponseSource,
    pub revalidation: Option<Revalidation>,
}

impl Handled {
    fn new(response: Response, source: ResponseSource) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }
}

/// Runtime-cacheable static response: 200, same-origin, not redirected
pub fn is_runtime_cacheable(response: &Response) -> bool {
    response.status == 200 && response.kind == ResponseType::Basic && !response.redirected
}

/// Storable font provider response. Opaque responses hide their status.
pub fn is_font_cacheable(response: &Response) -> bool {
    match response.kind {
        ResponseType::Opaque => true,
        ResponseType::Error => false,
        ResponseType::Basic | ResponseType::Cors => response.ok(),
    }
}

/// Executes the strategy for a classified request against one cache
pub struct PolicyExecutor {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    cache_name: CacheName,
    offline_document: RequestKey,
}

impl PolicyExecutor {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        cache_name: CacheName,
        offline_document: RequestKey,
    ) -> Self {
        Self {
            storage,
            fetcher,
            cache_name,
            offline_document,
        }
    }

    /// Route a request through the strategy for its class
    pub async fn execute(&self, class: RequestClass, request: &Request) -> SwResult<Handled> {
        let strategy = Strategy::from(class);
        debug!(url = %request.url, %class, %strategy, "routing request");

        match strategy {
            Strategy::CacheFirst => self.cache_first(request, is_runtime_cacheable).await,
            Strategy::CacheFirstImmutable => self.cache_first(request, is_font_cacheable).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::NetworkOnly => self.network_only(request).await,
        }
    }

    async fn cache_first(
        &self,
        request: &Request,
        storable: fn(&Response) -> bool,
    ) -> SwResult<Handled> {
        let key = request.key();
        let cache = self.open().await;

        if let Some(cache) = &cache {
            if let Some(hit) = lookup(cache.as_ref(), &key).await {
                debug!(key = %key, "cache hit");
                return Ok(Handled::new(hit, ResponseSource::Cache));
            }
        }

        let response = self.fetcher.fetch(request).await?;
        match &cache {
            Some(cache) if storable(&response) => store(cache.as_ref(), &key, &response).await,
            _ => debug!(
                key = %key,
                status = response.status,
                kind = %response.kind,
                "response not cached"
            ),
        }

        Ok(Handled::new(response, ResponseSource::Network))
    }

    async fn stale_while_revalidate(&self, request: &Request) -> SwResult<Handled> {
        let key = request.key();
        let Some(cache) = self.open().await else {
            return self.network_only(request).await;
        };

        let Some(hit) = lookup(cache.as_ref(), &key).await else {
            let response = self.fetcher.fetch(request).await?;
            if is_font_cacheable(&response) {
                store(cache.as_ref(), &key, &response).await;
            }
            return Ok(Handled::new(response, ResponseSource::Network));
        };

        let fetcher = Arc::clone(&self.fetcher);
        let background = request.clone();
        let handle = tokio::spawn(async move {
            match fetcher.fetch(&background).await {
                Ok(fresh) if is_font_cacheable(&fresh) => {
                    store(cache.as_ref(), &background.key(), &fresh).await;
                    debug!(url = %background.url, "revalidated");
                }
                Ok(fresh) => debug!(
                    url = %background.url,
                    status = fresh.status,
                    "revalidation response not cached"
                ),
                Err(e) => warn!("Revalidation of {} failed: {}", background.url, e),
            }
        });

        Ok(Handled {
            response: hit,
            source: ResponseSource::Cache,
            revalidation: Some(Revalidation { handle }),
        })
    }

    async fn network_first(&self, request: &Request) -> SwResult<Handled> {
        let err = match self.fetcher.fetch(request).await {
            Ok(response) => return Ok(Handled::new(response, ResponseSource::Network)),
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };

        warn!("Navigation to {} failed, serving offline document: {}", request.url, err);
        let fallback = match self.open().await {
            Some(cache) => lookup(cache.as_ref(), &self.offline_document).await,
            None => None,
        };

        match fallback {
            Some(document) => Ok(Handled::new(document, ResponseSource::Fallback)),
            None => {
                warn!("Offline document {} is not cached", self.offline_document.url);
                Err(err)
            }
        }
    }

    async fn network_only(&self, request: &Request) -> SwResult<Handled> {
        let response = self.fetcher.fetch(request).await?;
        Ok(Handled::new(response, ResponseSource::Network))
    }

    async fn open(&self) -> Option<Arc<dyn Cache>> {
        match self.storage.open(&self.cache_name).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                degraded(&format!("Opening cache {}", self.cache_name), &e);
                None
            }
        }
    }
}

async fn lookup(cache: &dyn Cache, key: &RequestKey) -> Option<Response> {
    match cache.lookup(key).await {
        Ok(hit) => hit,
        Err(e) => {
            degraded(&format!("Cache lookup for {}", key), &e);
            None
        }
    }
}

async fn store(cache: &dyn Cache, key: &RequestKey, response: &Response) {
    if let Err(e) = cache.put(key, response).await {
        degraded(&format!("Cache write for {}", key), &e);
    }
}

/// Cache failures never fail a request. Expected store failures are
/// warnings; anything else points at a bug or corrupt store.
fn degraded(action: &str, e: &SwError) {
    if e.is_soft() {
        warn!("{} failed, continuing without cache: {}", action, e);
    } else {
        error!("{} failed unexpectedly, continuing without cache: {}", action, e);
    }
}
