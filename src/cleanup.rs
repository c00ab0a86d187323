use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::{KeyValueStore, StorageScope, Storages};

/// Removes a fixed set of keys from one storage scope when dropped.
///
/// Hold the guard for as long as the owner of the keys is alive.
pub struct ScopeCleanup {
    store: Arc<dyn KeyValueStore>,
    scope: StorageScope,
    keys: Vec<String>,
    done: bool,
}

impl ScopeCleanup {
    pub fn new<I, K>(storages: &Storages, scope: StorageScope, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            store: storages.scope(scope),
            scope,
            keys: keys.into_iter().map(Into::into).collect(),
            done: false,
        }
    }

    pub fn scope(&self) -> StorageScope {
        self.scope
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Remove the keys now instead of on drop.
    /// Every key is attempted; the failures are returned.
    pub fn clear_now(mut self) -> Vec<(String, StorageError)> {
        self.done = true;
        self.remove_all()
    }

    fn remove_all(&self) -> Vec<(String, StorageError)> {
        let mut failures = Vec::new();
        for key in &self.keys {
            if let Err(e) = self.store.remove_item(key) {
                tracing::warn!(key = %key, scope = ?self.scope, error = %e, "Failed to clear stored key");
                failures.push((key.clone(), e));
            }
        }
        failures
    }
}

impl Drop for ScopeCleanup {
    fn drop(&mut self) {
        if !self.done {
            self.remove_all();
        }
    }
}
