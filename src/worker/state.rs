//! Worker lifecycle state and its persisted registration record

use crate::error::{SwError, SwResult};
use crate::store::CacheName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const REGISTRATION_FILE: &str = "registration.json";

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// Registration record shared by every invocation against one store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Version installed and waiting to activate
    pub installed: Option<CacheName>,

    /// Version currently serving requests
    pub active: Option<CacheName>,

    /// Whether the active version has claimed open pages
    pub controlling: bool,

    /// Last lifecycle change
    pub updated_at: Option<DateTime<Utc>>,
}

impl Registration {
    /// Registration file under a store root
    pub fn path(root: &Path) -> PathBuf {
        root.join(REGISTRATION_FILE)
    }

    /// Load the registration, empty if none was saved yet
    pub async fn load(root: &Path) -> SwResult<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| SwError::io(format!("reading registration {}", path.display()), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the registration atomically
    pub async fn save(&self, root: &Path) -> SwResult<()> {
        fs::create_dir_all(root)
            .await
            .map_err(|e| SwError::io(format!("creating store directory {}", root.display()), e))?;

        let path = Self::path(root);
        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        let content = serde_json::to_string_pretty(self)?;

        fs::write(&temp_path, content)
            .await
            .map_err(|e| SwError::io(format!("writing {}", temp_path.display()), e))?;
        fs::rename(&temp_path, &path)
            .await
            .map_err(|e| SwError::io(format!("replacing {}", path.display()), e))?;
        Ok(())
    }

    /// Record a successful install of `name`
    pub fn record_installed(&mut self, name: &CacheName) {
        self.installed = Some(name.clone());
        self.updated_at = Some(Utc::now());
    }

    /// Record activation of `name`; it replaces the previous active version
    pub fn record_activated(&mut self, name: &CacheName) {
        if self.installed.as_ref() == Some(name) {
            self.installed = None;
        }
        self.active = Some(name.clone());
        self.controlling = true;
        self.updated_at = Some(Utc::now());
    }
}
