//! Typed value mirrored into a [`KeyValueStore`].
//!
//! The in-memory value is authoritative. Reads from the store happen once,
//! at construction; every write updates memory first and then persists on a
//! best-effort basis, reporting what happened as a [`WriteOutcome`].

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;
use crate::storage::{KeyValueStore, StorageScope, Storages};

/// How the initial value was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Parsed from the store
    Restored,
    /// Nothing stored under the key
    Missing,
    /// Stored text did not parse as the expected type
    Corrupted,
    /// The store returned an error
    ReadFailed,
    /// No storage backend in this context
    Unavailable,
}

impl LoadOutcome {
    pub fn used_fallback(self) -> bool {
        self != LoadOutcome::Restored
    }
}

/// Result of persisting a new value
#[derive(Debug)]
pub enum WriteOutcome {
    Persisted,
    /// No storage backend; only the in-memory value changed
    Skipped,
    Failed(StorageError),
}

impl WriteOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, WriteOutcome::Persisted)
    }
}

/// A new value, or a function deriving it from the previous one
pub enum Update<T> {
    Value(T),
    With(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Update<T> {
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        Update::With(Box::new(f))
    }

    fn apply(self, previous: &T) -> T {
        match self {
            Update::Value(value) => value,
            Update::With(f) => f(previous),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Update::Value(value)
    }
}

pub struct PersistedState<T> {
    key: String,
    value: T,
    store: Arc<dyn KeyValueStore>,
    load_outcome: LoadOutcome,
}

impl<T> PersistedState<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Load `key` from `store`, falling back to `default` when it cannot be restored
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let (value, load_outcome) = load(store.as_ref(), &key, default);

        Self {
            key,
            value,
            store,
            load_outcome,
        }
    }

    pub fn in_scope(
        storages: &Storages,
        scope: StorageScope,
        key: impl Into<String>,
        default: T,
    ) -> Self {
        Self::new(storages.scope(scope), key, default)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        self.load_outcome
    }

    /// Replace the value in memory, then try to persist it
    pub fn set(&mut self, update: impl Into<Update<T>>) -> WriteOutcome {
        self.value = update.into().apply(&self.value);

        if !self.store.is_available() {
            return WriteOutcome::Skipped;
        }

        let serialized = match serde_json::to_string(&self.value) {
            Ok(s) => s,
            Err(source) => {
                let error = StorageError::Serialize {
                    key: self.key.clone(),
                    source,
                };
                tracing::warn!(key = %self.key, error = %error, "Failed to persist value");
                return WriteOutcome::Failed(error);
            }
        };

        match self.store.set_item(&self.key, &serialized) {
            Ok(()) => WriteOutcome::Persisted,
            Err(error) => {
                tracing::warn!(key = %self.key, error = %error, "Failed to persist value");
                WriteOutcome::Failed(error)
            }
        }
    }

    pub fn update<F>(&mut self, f: F) -> WriteOutcome
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        self.set(Update::with(f))
    }
}

impl<T: Clone> PersistedState<T> {
    pub fn get(&self) -> T {
        self.value.clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistedState")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("load_outcome", &self.load_outcome)
            .finish()
    }
}

fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> (T, LoadOutcome) {
    if !store.is_available() {
        return (default, LoadOutcome::Unavailable);
    }

    let raw = match store.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (default, LoadOutcome::Missing),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to read stored value, using default");
            return (default, LoadOutcome::ReadFailed);
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => (value, LoadOutcome::Restored),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Stored value is corrupt, using default");
            (default, LoadOutcome::Corrupted)
        }
    }
}
