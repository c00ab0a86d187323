//! Key-value storage scopes backing persisted dashboard state.
//!
//! Two scopes exist: a durable one that survives restarts and a session one
//! that lives as long as the process. Contexts without storage get a
//! [`NoopStore`], which reports itself unavailable.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::{StorageError, StorageResult};

/// Text key-value store with browser-storage semantics
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// `false` when running without a storage backend
    fn is_available(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageScope {
    Durable,
    Session,
}

/// One store per scope
#[derive(Clone)]
pub struct Storages {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl Storages {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Durable scope on disk at `path`, session scope in memory
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Ok(Self::new(
            Arc::new(FileStore::open(path)?),
            Arc::new(MemoryStore::new()),
        ))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// No storage backend at all
    pub fn detached() -> Self {
        Self::new(Arc::new(NoopStore), Arc::new(NoopStore))
    }

    pub fn scope(&self, scope: StorageScope) -> Arc<dyn KeyValueStore> {
        match scope {
            StorageScope::Durable => Arc::clone(&self.durable),
            StorageScope::Session => Arc::clone(&self.session),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let items = self.items.read().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        items.remove(key);
        Ok(())
    }
}

/// JSON document on disk holding every item of the scope.
/// Each mutation rewrites the document through a temp file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: RwLock<HashMap<String, String>>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let items = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling of the document with `.tmp` appended to the full file name
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn flush(&self, items: &HashMap<String, String>) -> StorageResult<()> {
        let io_err = |source: io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let contents = serde_json::to_string(items).map_err(|source| StorageError::Serialize {
            key: self.path.display().to_string(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, contents).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let items = self.items.read().map_err(|_| StorageError::Poisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items) {
            // Keep memory and disk in agreement
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self.items.write().map_err(|_| StorageError::Poisoned)?;
        let Some(previous) = items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&items) {
            items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}

/// Store for contexts with no storage backend
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

impl KeyValueStore for NoopStore {
    fn get_item(&self, _key: &str) -> StorageResult<Option<String>> {
        Ok(None)
    }

    fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Ok(())
    }

    fn remove_item(&self, _key: &str) -> StorageResult<()> {
        Ok(())
    }

    fn is_available(&self) -> bool {
        false
    }
}
