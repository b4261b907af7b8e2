//! Synchronous string key-value persistence used by the draft store.

use crate::error::ComposerError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Every call may fail (quota, disabled storage, I/O); callers degrade.
pub trait KeyValueStore {
    fn keys(&self) -> Result<Vec<String>, ComposerError>;
    fn get(&self, key: &str) -> Result<Option<String>, ComposerError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ComposerError>;
    fn remove(&mut self, key: &str) -> Result<(), ComposerError>;
}

/// In-memory store. `available = false` simulates disabled storage and
/// `quota` caps the number of keys.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    available: bool,
    quota: Option<usize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            available: true,
            quota: None,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check(&self) -> Result<(), ComposerError> {
        if self.available {
            Ok(())
        } else {
            Err(ComposerError::PersistenceFailure("storage disabled".into()))
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn keys(&self) -> Result<Vec<String>, ComposerError> {
        self.check()?;
        Ok(self.entries.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, ComposerError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ComposerError> {
        self.check()?;
        if let Some(quota) = self.quota {
            if !self.entries.contains_key(key) && self.entries.len() >= quota {
                return Err(ComposerError::PersistenceFailure("quota exceeded".into()));
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ComposerError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by a single pretty-printed JSON object on disk. Every call
/// reads or rewrites the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_map(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save_map(&self, map: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> anyhow::Result<()> {
        let mut map = self.load_map()?;
        f(&mut map);
        self.save_map(&map)
    }
}

fn persistence(err: anyhow::Error) -> ComposerError {
    ComposerError::PersistenceFailure(err.to_string())
}

impl KeyValueStore for JsonFileStore {
    fn keys(&self) -> Result<Vec<String>, ComposerError> {
        Ok(self.load_map().map_err(persistence)?.into_keys().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, ComposerError> {
        Ok(self.load_map().map_err(persistence)?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ComposerError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
        .map_err(persistence)
    }

    fn remove(&mut self, key: &str) -> Result<(), ComposerError> {
        self.update(|map| {
            map.remove(key);
        })
        .map_err(persistence)
    }
}
