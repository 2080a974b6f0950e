//! Local session store.
//!
//! A flat key-value map holding cached session artifacts. The file-backed
//! store keeps everything in `<base>/session.json` with restricted
//! permissions (0600); values are never logged.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::paths;

/// Persistent key-value storage for session artifacts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Lists every key currently stored.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Reads a single value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes a single value, replacing any previous one.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes every listed key in one batch. Missing keys are ignored.
    async fn remove_many(&self, keys: &[String]) -> Result<()>;
}

/// File-backed store (`session.json`).
///
/// Every operation reloads the file so that concurrent processes observe
/// each other's writes; the in-process mutex serializes read-modify-write.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Opens the store at the default location.
    pub fn open_default() -> Self {
        Self::new(paths::session_store_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.load_checked()?.0)
    }

    /// Reads the map. An unparseable file reads as empty and is flagged so the
    /// next write replaces it.
    fn load_checked(&self) -> Result<(BTreeMap<String, String>, bool)> {
        if !self.path.exists() {
            return Ok((BTreeMap::new(), false));
        }

        let contents = fs::read_to_string(&self.path).with_context(|| {
            format!("Failed to read session store from {}", self.path.display())
        })?;
        if contents.trim().is_empty() {
            return Ok((BTreeMap::new(), false));
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok((entries, false)),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session store is corrupt; treating it as empty"
                );
                Ok((BTreeMap::new(), true))
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize session store")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn keys(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load()?.into_keys().collect())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load()?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);
        self.save(&entries)
    }

    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let (mut entries, corrupt) = self.load_checked()?;
        let before = entries.len();
        for key in keys {
            entries.remove(key);
        }
        if entries.len() == before && !corrupt {
            return Ok(());
        }
        self.save(&entries)
    }
}

/// In-memory store, for hosts without persistent storage and for tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
