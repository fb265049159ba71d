//! Versioned cache stores
//!
//! A [`CacheStorage`] holds named caches; each [`Cache`] maps a
//! [`RequestKey`] to a stored [`Response`]. Exactly one cache name is
//! current at a time. Older names are left untouched until the
//! activation reaper deletes them.
//!
//! # Guarantees
//!
//! | Operation | Guarantee |
//! |-----------|-----------|
//! | `put` | whole entry stored or rejected, never torn |
//! | `put` | only `GET` keys accepted |
//! | `lookup` | concurrent with `put`: old or new value, last write wins |
//! | `delete` | removes the cache and every entry in it |

pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::{SwError, SwResult};
use crate::http::{RequestKey, Response};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name of a cache store, e.g. `elite-fit-cache-v2`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheName(String);

impl CacheName {
    /// Validate and wrap a raw cache name
    pub fn new(name: impl Into<String>) -> SwResult<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(SwError::CacheNameInvalid(name));
        }
        Ok(Self(name))
    }

    /// Build the name for a deployment version: `{prefix}-v{version}`
    pub fn versioned(prefix: &str, version: u32) -> SwResult<Self> {
        Self::new(format!("{}-v{}", prefix, version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single named cache
#[async_trait]
pub trait Cache: Send + Sync {
    /// Name this cache was opened under
    fn name(&self) -> &CacheName;

    /// Look up a stored response; non-GET keys always miss
    async fn lookup(&self, key: &RequestKey) -> SwResult<Option<Response>>;

    /// Store a response, replacing any previous entry for the key
    async fn put(&self, key: &RequestKey, response: &Response) -> SwResult<()>;

    /// All keys currently stored
    async fn keys(&self) -> SwResult<Vec<RequestKey>>;
}

/// Collection of named caches
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a cache, creating it if absent
    async fn open(&self, name: &CacheName) -> SwResult<Arc<dyn Cache>>;

    /// Whether a cache with this name exists
    async fn has(&self, name: &CacheName) -> SwResult<bool>;

    /// Names of all existing caches, sorted
    async fn names(&self) -> SwResult<Vec<CacheName>>;

    /// Delete a cache; returns false if it did not exist
    async fn delete(&self, name: &CacheName) -> SwResult<bool>;
}

/// Reject keys a cache must not store
pub(crate) fn ensure_cacheable(key: &RequestKey) -> SwResult<()> {
    if key.is_cacheable() {
        Ok(())
    } else {
        Err(SwError::CacheMethodUnsupported {
            method: key.method.clone(),
            url: key.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_name() {
        let name = CacheName::versioned("elite-fit-cache", 2).unwrap();
        assert_eq!(name.as_str(), "elite-fit-cache-v2");
    }

    #[test]
    fn rejects_path_like_names() {
        assert!(CacheName::new("../etc").is_err());
        assert!(CacheName::new("a/b").is_err());
        assert!(CacheName::new("..").is_err());
        assert!(CacheName::new("").is_err());
    }

    #[test]
    fn post_keys_are_not_cacheable() {
        let key = RequestKey {
            method: "POST".to_string(),
            url: "https://elitefit.example/api".to_string(),
        };
        assert!(matches!(
            ensure_cacheable(&key),
            Err(SwError::CacheMethodUnsupported { .. })
        ));
    }
}
