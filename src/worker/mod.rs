//! Offline cache worker
//!
//! Wires the precache loader, the version reaper, the request classifier
//! and the policy executor into one lifecycle:
//!
//! ```text
//! parsed --install--> installing --ok--> installed --activate--> activating --> activated
//!                          \--err--> redundant
//! ```
//!
//! Requests are only routed once the worker is activated. The cache store
//! is an explicit handle passed in by the caller, so the same worker runs
//! against [`crate::store::MemoryStorage`] in tests and
//! [`crate::store::DiskStorage`] from the CLI.

pub mod classify;
pub mod policy;
pub mod precache;
pub mod reaper;
pub mod state;

pub use classify::{Classifier, FontOrigin, RequestClass};
pub use policy::{Handled, PolicyExecutor, ResponseSource, Revalidation, Strategy};
pub use precache::Precacher;
pub use reaper::Reaper;
pub use state::{Registration, WorkerState};

use crate::config::Config;
use crate::error::{SwError, SwResult};
use crate::http::{Request, RequestKey};
use crate::network::Fetcher;
use crate::store::{CacheName, CacheStorage};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Everything a worker version is built from
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub cache_name: CacheName,
    pub manifest: Vec<Url>,
    pub offline_document: Url,
    pub classifier: Classifier,
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> SwResult<Self> {
        Ok(Self {
            cache_name: config.cache_name()?,
            manifest: config.precache_urls()?,
            offline_document: config.resolve(&config.precache.offline_document)?,
            classifier: Classifier::new(&config.routing)?,
        })
    }

    /// Same routing, backed by another version's cache
    pub fn for_version(self, cache_name: CacheName) -> Self {
        Self { cache_name, ..self }
    }
}

/// One version of the cache worker
pub struct ServiceWorker {
    settings: WorkerSettings,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    executor: PolicyExecutor,
    state: WorkerState,
    controlling: bool,
}

impl ServiceWorker {
    /// A freshly parsed worker that has not been installed yet
    pub fn new(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let executor = PolicyExecutor::new(
            Arc::clone(&storage),
            Arc::clone(&fetcher),
            settings.cache_name.clone(),
            RequestKey::get(&settings.offline_document),
        );

        Self {
            settings,
            storage,
            fetcher,
            executor,
            state: WorkerState::Parsed,
            controlling: false,
        }
    }

    /// Rebuild the worker that controls pages: the version the
    /// registration records as active, even when `settings` names a newer
    /// version that has not activated yet
    pub fn resume_active(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        registration: &Registration,
    ) -> SwResult<Self> {
        let Some(active) = &registration.active else {
            return Err(SwError::NotActivated(settings.cache_name.to_string()));
        };
        if active != &settings.cache_name {
            debug!(
                "{} is not active yet, serving {}",
                settings.cache_name, active
            );
        }

        let mut worker = Self::new(settings.for_version(active.clone()), storage, fetcher);
        worker.state = WorkerState::Activated;
        worker.controlling = registration.controlling;
        Ok(worker)
    }

    /// Rebuild the configured version while it is installed and waiting
    pub fn resume_waiting(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
        registration: &Registration,
    ) -> SwResult<Self> {
        if registration.installed.as_ref() != Some(&settings.cache_name) {
            return Err(SwError::NotInstalled(settings.cache_name.to_string()));
        }

        let mut worker = Self::new(settings, storage, fetcher);
        worker.state = WorkerState::Installed;
        Ok(worker)
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn cache_name(&self) -> &CacheName {
        &self.settings.cache_name
    }

    /// Whether the worker has claimed open pages
    pub fn is_controlling(&self) -> bool {
        self.controlling
    }

    /// Classify a request without routing it
    pub fn classify(&self, request: &Request) -> RequestClass {
        self.settings.classifier.classify(request)
    }

    /// Install: precache the manifest. Returns the number of entries stored.
    pub async fn install(&mut self) -> SwResult<usize> {
        self.expect_state(WorkerState::Parsed, "install")?;
        self.state = WorkerState::Installing;
        info!("Installing {}", self.settings.cache_name);

        let precacher = Precacher::new(Arc::clone(&self.storage), Arc::clone(&self.fetcher));
        match precacher
            .run(&self.settings.cache_name, &self.settings.manifest)
            .await
        {
            Ok(stored) => {
                self.state = WorkerState::Installed;
                info!("Installed {}", self.settings.cache_name);
                Ok(stored)
            }
            Err(e) => {
                self.state = WorkerState::Redundant;
                warn!("Install of {} failed: {}", self.settings.cache_name, e);
                Err(SwError::InstallFailed {
                    cache: self.settings.cache_name.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Activate: delete stale caches, then claim open pages.
    /// Returns the names of the deleted caches.
    pub async fn activate(&mut self) -> SwResult<Vec<CacheName>> {
        self.expect_state(WorkerState::Installed, "activate")?;
        self.state = WorkerState::Activating;

        let reaper = Reaper::new(Arc::clone(&self.storage));
        match reaper.run(&self.settings.cache_name).await {
            Ok(deleted) => {
                self.state = WorkerState::Activated;
                self.controlling = true;
                info!(
                    "Activated {} ({} stale caches removed)",
                    self.settings.cache_name,
                    deleted.len()
                );
                Ok(deleted)
            }
            Err(e) => {
                self.state = WorkerState::Installed;
                Err(e)
            }
        }
    }

    /// Route an intercepted request through its caching strategy
    pub async fn handle_fetch(&self, request: &Request) -> SwResult<Handled> {
        if self.state != WorkerState::Activated {
            return Err(SwError::NotActivated(self.settings.cache_name.to_string()));
        }

        let class = self.classify(request);
        self.executor.execute(class, request).await
    }

    fn expect_state(&self, expected: WorkerState, action: &str) -> SwResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SwError::InvalidTransition {
                action: action.to_string(),
                state: self.state.to_string(),
            })
        }
    }
}
