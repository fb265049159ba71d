//! Filesystem-backed cache storage
//!
//! # Layout
//!
//! ```text
//! {root}/
//!   registration.json          # worker lifecycle record (not a cache)
//!   {cache-name}/
//!     {sha256(key)}.entry      # JSON metadata line, '\n', raw body
//! ```
//!
//! Entries are written to a uniquely named temp file and renamed into
//! place, so readers never observe a partially written entry.

use crate::error::{SwError, SwResult};
use crate::http::{RequestKey, Response, ResponseType};
use crate::store::{ensure_cacheable, Cache, CacheName, CacheStorage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const ENTRY_EXT: &str = "entry";

/// Metadata line stored ahead of the body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    key: RequestKey,
    status: u16,
    kind: ResponseType,
    url: String,
    redirected: bool,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Cache stored as one directory of entry files
#[derive(Debug)]
pub struct DiskCache {
    name: CacheName,
    dir: PathBuf,
}

impl DiskCache {
    fn entry_path(&self, key: &RequestKey) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        self.dir.join(format!("{}.{}", digest, ENTRY_EXT))
    }

    fn err(&self, action: &str, e: impl std::fmt::Display) -> SwError {
        SwError::store(self.name.as_str(), format!("{}: {}", action, e))
    }

    async fn read_entry(&self, path: &Path) -> SwResult<Option<(EntryMeta, Vec<u8>)>> {
        let raw = match fs::read(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.err(&format!("reading {}", path.display()), e)),
        };

        let split = raw
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| self.err("corrupt entry", path.display()))?;
        let meta: EntryMeta = serde_json::from_slice(&raw[..split])
            .map_err(|e| self.err(&format!("parsing {}", path.display()), e))?;
        let body = raw[split + 1..].to_vec();
        Ok(Some((meta, body)))
    }
}

#[async_trait]
impl Cache for DiskCache {
    fn name(&self) -> &CacheName {
        &self.name
    }

    async fn lookup(&self, key: &RequestKey) -> SwResult<Option<Response>> {
        if !key.is_cacheable() {
            return Ok(None);
        }

        let Some((meta, body)) = self.read_entry(&self.entry_path(key)).await? else {
            return Ok(None);
        };

        // Digest collision or a foreign file under our name
        if &meta.key != key {
            return Ok(None);
        }

        Ok(Some(Response {
            status: meta.status,
            kind: meta.kind,
            url: meta.url,
            redirected: meta.redirected,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, key: &RequestKey, response: &Response) -> SwResult<()> {
        ensure_cacheable(key)?;

        let meta = EntryMeta {
            key: key.clone(),
            status: response.status,
            kind: response.kind,
            url: response.url.clone(),
            redirected: response.redirected,
            headers: response.headers.clone(),
            stored_at: Utc::now(),
        };
        let mut content = serde_json::to_vec(&meta)?;
        content.push(b'\n');
        content.extend_from_slice(&response.body);

        let path = self.entry_path(key);
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4()));

        fs::write(&temp_path, &content)
            .await
            .map_err(|e| self.err("writing temp entry", e))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.err("renaming temp entry", e));
        }

        debug!(cache = %self.name, key = %key, bytes = response.body.len(), "stored entry");
        Ok(())
    }

    async fn keys(&self) -> SwResult<Vec<RequestKey>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.err("listing entries", e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| self.err("listing entries", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXT) {
                if let Some((meta, _)) = self.read_entry(&path).await? {
                    keys.push(meta.key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Cache storage rooted at a directory
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &CacheName) -> PathBuf {
        self.root.join(name.as_str())
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &CacheName) -> SwResult<Arc<dyn Cache>> {
        let dir = self.cache_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SwError::store(name.as_str(), format!("creating {}: {}", dir.display(), e)))?;

        Ok(Arc::new(DiskCache {
            name: name.clone(),
            dir,
        }))
    }

    async fn has(&self, name: &CacheName) -> SwResult<bool> {
        Ok(fs::metadata(self.cache_dir(name))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }

    async fn names(&self) -> SwResult<Vec<CacheName>> {
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SwError::io(format!("listing {}", self.root.display()), e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| SwError::io(format!("listing {}", self.root.display()), e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry
                .file_name()
                .to_str()
                .and_then(|s| CacheName::new(s).ok())
            {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &CacheName) -> SwResult<bool> {
        match fs::remove_dir_all(self.cache_dir(name)).await {
            Ok(()) => {
                debug!(cache = %name, "deleted cache directory");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SwError::store(name.as_str(), format!("deleting: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use tempfile::TempDir;

    fn name(s: &str) -> CacheName {
        CacheName::new(s).unwrap()
    }

    fn key(url: &str) -> RequestKey {
        Request::parse(url).unwrap().key()
    }

    #[tokio::test]
    async fn entry_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        let k = key("https://elitefit.example/index.html");
        let resp = Response::basic(&k.url, 200, "<html>\nbody\n</html>")
            .with_header("content-type", "text/html");

        storage.open(&name("app-v1")).await.unwrap().put(&k, &resp).await.unwrap();

        let reopened = DiskStorage::new(temp.path());
        let hit = reopened
            .open(&name("app-v1"))
            .await
            .unwrap()
            .lookup(&k)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit, resp);
    }

    #[tokio::test]
    async fn put_overwrites_entry() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        let cache = storage.open(&name("app-v1")).await.unwrap();
        let k = key("https://fonts.googleapis.com/css2?family=Oswald");

        cache.put(&k, &Response::basic(&k.url, 200, "old")).await.unwrap();
        cache.put(&k, &Response::basic(&k.url, 200, "new")).await.unwrap();

        assert_eq!(cache.lookup(&k).await.unwrap().unwrap().body, b"new");
        assert_eq!(cache.keys().await.unwrap(), vec![k]);
    }

    #[tokio::test]
    async fn names_skip_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("registration.json"), "{}").unwrap();
        let storage = DiskStorage::new(temp.path());
        storage.open(&name("app-v2")).await.unwrap();
        storage.open(&name("app-v1")).await.unwrap();

        assert_eq!(
            storage.names().await.unwrap(),
            vec![name("app-v1"), name("app-v2")]
        );
    }

    #[tokio::test]
    async fn missing_root_has_no_names() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path().join("absent"));
        assert!(storage.names().await.unwrap().is_empty());
        assert!(!storage.has(&name("app-v1")).await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_entries() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        let k = key("https://elitefit.example/css/style.min.css");
        storage
            .open(&name("app-v1"))
            .await
            .unwrap()
            .put(&k, &Response::basic(&k.url, 200, "body{}"))
            .await
            .unwrap();

        assert!(storage.delete(&name("app-v1")).await.unwrap());
        assert!(!storage.has(&name("app-v1")).await.unwrap());
        assert!(!storage.delete(&name("app-v1")).await.unwrap());
    }
}
