use serde::{Deserialize, Serialize};
use std::sync::Arc;

use fieldwatch_gateway::error::{StorageError, StorageResult};
use fieldwatch_gateway::persisted::{LoadOutcome, PersistedState, Update, WriteOutcome};
use fieldwatch_gateway::storage::{
    FileStore, KeyValueStore, MemoryStore, NoopStore, StorageScope, Storages,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexSelection {
    index: String,
    opacity: f32,
    fields: Vec<u32>,
}

fn selection() -> IndexSelection {
    IndexSelection {
        index: "NDVI".to_string(),
        opacity: 0.75,
        fields: vec![3, 7, 11],
    }
}

/// Store whose writes always fail
struct ReadOnlyStore(MemoryStore);

impl KeyValueStore for ReadOnlyStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.0.get_item(key)
    }

    fn set_item(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err(StorageError::Poisoned)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.0.remove_item(key)
    }
}

#[test]
fn test_round_trip_through_store() {
    // Given: A value written under a key
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut writer = PersistedState::new(Arc::clone(&store), "dashboard.index", selection());
    let mut expected = selection();
    expected.index = "NDRE".to_string();
    assert!(writer.set(expected.clone()).is_persisted());

    // When: A new state reads the same key
    let reader = PersistedState::new(store, "dashboard.index", selection());

    // Then: Deep-equal value, restored rather than defaulted
    assert_eq!(reader.value(), &expected);
    assert_eq!(reader.load_outcome(), LoadOutcome::Restored);
    assert!(!reader.load_outcome().used_fallback());
}

#[test]
fn test_missing_key_uses_default() {
    let state = PersistedState::new(Arc::new(MemoryStore::new()), "absent", 5u32);

    assert_eq!(state.get(), 5);
    assert_eq!(state.load_outcome(), LoadOutcome::Missing);
    assert!(state.load_outcome().used_fallback());
}

#[test]
fn test_corrupt_value_falls_back_once() {
    let store = Arc::new(MemoryStore::new());
    store.set_item("dashboard.index", "{not json").expect("seed");

    let mut state = PersistedState::new(store.clone(), "dashboard.index", selection());

    assert_eq!(state.value(), &selection());
    assert_eq!(state.load_outcome(), LoadOutcome::Corrupted);

    // The next write repairs the stored copy
    assert!(state.set(selection()).is_persisted());
    let stored = store.get_item("dashboard.index").expect("get").expect("present");
    let parsed: IndexSelection = serde_json::from_str(&stored).expect("valid json");
    assert_eq!(parsed, selection());
}

#[test]
fn test_wrong_shape_counts_as_corrupt() {
    let store = Arc::new(MemoryStore::new());
    store.set_item("count", "\"seven\"").expect("seed");

    let state = PersistedState::new(store, "count", 0u32);
    assert_eq!(state.get(), 0);
    assert_eq!(state.load_outcome(), LoadOutcome::Corrupted);
}

#[test]
fn test_functional_update_sees_previous_value() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut state = PersistedState::new(Arc::clone(&store), "visits", 1u32);

    assert!(state.update(|n| n + 1).is_persisted());
    assert!(state.set(Update::with(|n: &u32| n * 10)).is_persisted());

    assert_eq!(state.get(), 20);
    assert_eq!(store.get_item("visits").expect("get").as_deref(), Some("20"));
}

#[test]
fn test_unavailable_store_skips_persistence() {
    let mut state = PersistedState::new(Arc::new(NoopStore), "theme", "light".to_string());
    assert_eq!(state.load_outcome(), LoadOutcome::Unavailable);

    let outcome = state.set("dark".to_string());

    assert!(matches!(outcome, WriteOutcome::Skipped));
    assert_eq!(state.value(), "dark");
}

#[test]
fn test_failed_write_keeps_in_memory_value() {
    let mut state = PersistedState::new(Arc::new(ReadOnlyStore(MemoryStore::new())), "k", 1i64);

    let outcome = state.set(2i64);

    assert!(matches!(outcome, WriteOutcome::Failed(StorageError::Poisoned)));
    assert_eq!(state.get(), 2);
}

#[test]
fn test_durable_scope_survives_reopen() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("durable.json");

    {
        let storages = Storages::open(&path).expect("open storages");
        let mut state =
            PersistedState::in_scope(&storages, StorageScope::Durable, "selection", selection());
        state.update(|s| IndexSelection {
            opacity: 0.5,
            ..s.clone()
        });

        let mut session =
            PersistedState::in_scope(&storages, StorageScope::Session, "draft", String::new());
        assert!(session.set("unsaved".to_string()).is_persisted());
    }

    let storages = Storages::open(&path).expect("reopen storages");
    let state = PersistedState::in_scope(&storages, StorageScope::Durable, "selection", selection());
    assert_eq!(state.load_outcome(), LoadOutcome::Restored);
    assert_eq!(state.value().opacity, 0.5);

    // Session scope starts empty after a restart
    let session = PersistedState::in_scope(&storages, StorageScope::Session, "draft", String::new());
    assert_eq!(session.load_outcome(), LoadOutcome::Missing);
}

#[test]
fn test_corrupt_durable_file_is_reported() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("durable.json");
    std::fs::write(&path, "[1, 2").expect("write corrupt file");

    let err = FileStore::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Corrupt { .. }), "got: {}", err);
}

#[test]
fn test_file_store_creates_parent_directories() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nested").join("state.json");

    let store = FileStore::open(&path).expect("open");
    store.set_item("a", "1").expect("set");

    assert!(path.exists());
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn test_failed_remove_keeps_key_in_memory_and_on_disk() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("durable.json");
    let store = FileStore::open(&path).expect("open");
    store.set_item("k", "1").expect("set");

    // Block the temp file so the next flush fails
    std::fs::create_dir(dir.path().join("durable.json.tmp")).expect("block temp file");

    assert!(store.remove_item("k").is_err());
    assert_eq!(store.get_item("k").expect("get").as_deref(), Some("1"));

    let reopened = FileStore::open(&path).expect("reopen");
    assert_eq!(reopened.get_item("k").expect("get").as_deref(), Some("1"));
}
