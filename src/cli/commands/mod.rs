//! CLI command implementations

pub mod activate;
pub mod cache;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod install;
pub mod status;

pub use activate::execute as activate;
pub use cache::execute as cache;
pub use classify::execute as classify;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use status::execute as status;

use crate::config::Config;
use crate::error::SwResult;
use crate::network::HttpFetcher;
use crate::store::DiskStorage;
use crate::worker::{Registration, ServiceWorker, WorkerSettings};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// On-disk store, network client and worker settings for one site
pub(crate) struct Site {
    pub storage: Arc<DiskStorage>,
    pub fetcher: Arc<HttpFetcher>,
    pub settings: WorkerSettings,
}

impl Site {
    pub fn open(config: &Config) -> SwResult<Self> {
        let root = config.store_dir();
        debug!("Cache store at {}", root.display());

        Ok(Self {
            storage: Arc::new(DiskStorage::new(root)),
            fetcher: Arc::new(HttpFetcher::new(&config.scope_url()?, &config.network)),
            settings: WorkerSettings::from_config(config)?,
        })
    }

    /// Directory holding the cache stores and the registration
    pub fn root(&self) -> &Path {
        self.storage.root()
    }

    pub async fn registration(&self) -> SwResult<Registration> {
        Registration::load(self.root()).await
    }

    /// A fresh worker for the configured version
    pub fn worker(&self) -> ServiceWorker {
        ServiceWorker::new(
            self.settings.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
        )
    }

    /// The worker currently serving pages, possibly an older version
    pub fn active(&self, registration: &Registration) -> SwResult<ServiceWorker> {
        ServiceWorker::resume_active(
            self.settings.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
            registration,
        )
    }

    /// The configured version, installed and waiting to activate
    pub fn waiting(&self, registration: &Registration) -> SwResult<ServiceWorker> {
        ServiceWorker::resume_waiting(
            self.settings.clone(),
            self.storage.clone(),
            self.fetcher.clone(),
            registration,
        )
    }
}
