//! Error types for swcache
//!
//! All modules use `SwResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swcache operations
pub type SwResult<T> = Result<T, SwError>;

/// All errors that can occur in swcache
#[derive(Error, Debug)]
pub enum SwError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    UrlInvalid { url: String, reason: String },

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    // Cache store errors
    #[error("Invalid cache name: {0}")]
    CacheNameInvalid(String),

    #[error("Cache store error in {cache}: {reason}")]
    CacheStore { cache: String, reason: String },

    #[error("Cannot cache {method} request for {url}; only GET is cacheable")]
    CacheMethodUnsupported { method: String, url: String },

    // Lifecycle errors
    #[error("Precache failed for {url}: {reason}")]
    PrecacheFailed { url: String, reason: String },

    #[error("Install of {cache} failed: {reason}")]
    InstallFailed { cache: String, reason: String },

    #[error("Worker cannot {action} while {state}")]
    InvalidTransition { action: String, state: String },

    #[error("No activated worker for {0}")]
    NotActivated(String),

    #[error("{0} is not installed and waiting")]
    NotInstalled(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SwError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache store error
    pub fn store(cache: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheStore {
            cache: cache.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is a network failure
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if the error is a soft cache failure that should fall back to the network
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::CacheStore { .. } | Self::CacheMethodUnsupported { .. } | Self::Io { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotActivated(_) | Self::NotInstalled(_) => Some("Run: swcache install"),
            Self::PrecacheFailed { .. } | Self::InstallFailed { .. } => {
                Some("Check that every precache.urls entry is deployed at site.origin")
            }
            Self::ConfigInvalid { .. } => Some("Run: swcache config show"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SwError::network("https://example.com/", "connection refused");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = SwError::NotActivated("elite-fit-cache-v2".to_string());
        assert_eq!(err.hint(), Some("Run: swcache install"));
    }

    #[test]
    fn error_soft() {
        assert!(SwError::store("v1", "quota exceeded").is_soft());
        assert!(!SwError::network("https://example.com/", "offline").is_soft());
        assert!(SwError::network("https://example.com/", "offline").is_network());
    }
}
