//! Configuration schema for swcache
//!
//! Configuration is stored at `~/.config/swcache/config.toml`

use crate::error::{SwError, SwResult};
use crate::store::CacheName;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Site the worker is registered for
    pub site: SiteConfig,

    /// Cache store naming and location
    pub cache: CacheConfig,

    /// Install-time precache manifest
    pub precache: PrecacheConfig,

    /// Request classification rules
    pub routing: RoutingConfig,

    /// Network client settings
    pub network: NetworkConfig,

    /// Lifecycle behavior
    pub lifecycle: LifecycleConfig,
}

impl Config {
    /// Name of the current-version cache store
    pub fn cache_name(&self) -> SwResult<CacheName> {
        CacheName::versioned(&self.cache.prefix, self.cache.version)
    }

    /// Absolute URL of the worker scope
    pub fn scope_url(&self) -> SwResult<Url> {
        let origin = Url::parse(&self.site.origin).map_err(|e| SwError::UrlInvalid {
            url: self.site.origin.clone(),
            reason: e.to_string(),
        })?;
        origin.join(&self.site.scope).map_err(|e| SwError::UrlInvalid {
            url: self.site.scope.clone(),
            reason: e.to_string(),
        })
    }

    /// Resolve a root-relative path (e.g. `./index.html`) against the scope
    pub fn resolve(&self, path: &str) -> SwResult<Url> {
        self.scope_url()?.join(path).map_err(|e| SwError::UrlInvalid {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Precache manifest as absolute URLs, in declaration order
    pub fn precache_urls(&self) -> SwResult<Vec<Url>> {
        self.precache.urls.iter().map(|p| self.resolve(p)).collect()
    }

    /// Where cache stores and the registration record live
    pub fn store_dir(&self) -> PathBuf {
        self.cache.store_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("swcache")
                .join("caches")
        })
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Site settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin pages are served from; responses from it are "basic"
    pub origin: String,

    /// Worker scope path under the origin
    pub scope: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            scope: "/".to_string(),
        }
    }
}

/// Cache store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache name prefix
    pub prefix: String,

    /// Deployment version; bump to invalidate every previous cache
    pub version: u32,

    /// Override for the on-disk store directory
    pub store_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: "elite-fit-cache".to_string(),
            version: 2,
            store_dir: None,
        }
    }
}

/// Precache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheConfig {
    /// Paths fetched and stored at install, relative to the scope
    pub urls: Vec<String>,

    /// Document served when a navigation cannot reach the network
    pub offline_document: String,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            urls: vec![
                "./".to_string(),
                "./index.html".to_string(),
                "./css/style.min.css".to_string(),
                "./js/main.min.js".to_string(),
                "./js/theme-switcher.min.js".to_string(),
            ],
            offline_document: "./index.html".to_string(),
        }
    }
}

/// Routing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path extensions served cache-first, matched case-insensitively
    pub static_extensions: Vec<String>,

    /// Font stylesheet origin (stale-while-revalidate)
    pub font_stylesheet_origin: String,

    /// Font file origin (cache-first, never revalidated)
    pub font_binary_origin: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            static_extensions: ["ttf", "woff", "woff2", "png", "jpg", "jpeg", "webp", "svg", "css", "js"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            font_stylesheet_origin: "https://fonts.googleapis.com".to_string(),
            font_binary_origin: "https://fonts.gstatic.com".to_string(),
        }
    }
}

/// Network client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Largest response body read from the network, in bytes
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("swcache/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 1024 * 1024 * 1024,
        }
    }
}

/// Lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Activate immediately after a successful install
    pub skip_waiting: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self { skip_waiting: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[routing]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache_name().unwrap().as_str(), "elite-fit-cache-v2");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            version = 7
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache_name().unwrap().as_str(), "elite-fit-cache-v7");
        assert_eq!(config.precache.urls.len(), 5); // default preserved
    }

    #[test]
    fn network_body_limit_defaults_large() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.network.max_body_bytes > 10 * 1024 * 1024);

        let config: Config = toml::from_str("[network]\nmax_body_bytes = 2048\n").unwrap();
        assert_eq!(config.network.max_body_bytes, 2048);
        assert_eq!(config.network.timeout_secs, 30);
    }

    #[test]
    fn precache_urls_resolve_against_scope() {
        let toml = r#"
            [site]
            origin = "https://elitefit.example"
            scope = "/gym/"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let urls = config.precache_urls().unwrap();
        assert_eq!(urls[0].as_str(), "https://elitefit.example/gym/");
        assert_eq!(urls[1].as_str(), "https://elitefit.example/gym/index.html");
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let mut config = Config::default();
        config.site.origin = "not a url".to_string();
        assert!(matches!(config.scope_url(), Err(SwError::UrlInvalid { .. })));
    }
}
