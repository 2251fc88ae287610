//! Unit tests for the HistoryStore public API.
//!
//! These tests exercise adding, listing, removing and clearing crops through
//! `HistoryStoreTrait`, plus the quota-aware persistence, using an in-memory
//! key-value store.

use pastecrop::managers::history_store::{HistoryStore, HistoryStoreTrait};
use pastecrop::storage::{KeyValueStore, MemoryStore, SqliteStore};
use pastecrop::types::errors::{HistoryError, StorageError};
use pastecrop::types::history::{
    HistoryConsistency, HistoryList, PersistOutcome, HISTORY_KEY, MAX_HISTORY_ITEMS,
};
use rstest::rstest;

/// Helper: an initialized store over an unbounded in-memory backend.
fn setup() -> HistoryStore<MemoryStore> {
    let mut store = HistoryStore::new(MemoryStore::new());
    store.initialize();
    store
}

/// Helper: a PNG-looking data URL with `n` payload bytes.
fn image_of_size(tag: char, n: usize) -> String {
    format!("data:image/png;base64,{}", tag.to_string().repeat(n))
}

/// Simulates a reload: hand the backing storage to a fresh store.
fn reload<S: KeyValueStore>(store: HistoryStore<S>) -> HistoryStore<S> {
    let mut fresh = HistoryStore::new(store.into_storage());
    fresh.initialize();
    fresh
}

/// Backend whose writes always fail with a non-quota error.
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::DatabaseError("disk I/O error".to_string()))
    }
    fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::DatabaseError("disk I/O error".to_string()))
    }
    fn remove_item(&mut self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::DatabaseError("disk I/O error".to_string()))
    }
}

#[test]
fn test_initialize_without_persisted_key_is_empty() {
    let store = setup();
    assert!(store.list().is_empty());
    assert_eq!(store.last_persist(), PersistOutcome::Idle);
}

#[rstest]
#[case("not json at all")]
#[case("{\"id\": 1}")]
#[case("[{\"id\": \"one\", \"src\": \"data:,\", \"timestamp\": \"2024-01-01T00:00:00Z\"}]")]
#[case("[{\"id\": 1, \"src\": \"data:,\", \"timestamp\": \"yesterday\"}]")]
fn test_initialize_with_unparseable_mirror_is_empty(#[case] raw: &str) {
    let mut storage = MemoryStore::new();
    storage.set_item(HISTORY_KEY, raw).unwrap();

    let mut store = HistoryStore::new(storage);
    let loaded = store.initialize();

    assert!(loaded.is_empty());
    assert!(store.list().is_empty());
}

#[test]
fn test_initialize_reads_browser_written_history() {
    let raw = r#"[
        {"id": 1700000000002, "src": "data:image/png;base64,BBB", "timestamp": "2023-11-14T22:13:20.002Z"},
        {"id": 1700000000001, "src": "data:image/png;base64,AAA", "timestamp": "2023-11-14T22:13:20.001Z"}
    ]"#;
    let mut storage = MemoryStore::new();
    storage.set_item(HISTORY_KEY, raw).unwrap();

    let mut store = HistoryStore::new(storage);
    let loaded = store.initialize();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].id, 1700000000002);
    assert_eq!(loaded[0].encoded_image, "data:image/png;base64,BBB");
    assert_eq!(loaded[1].created_at.timestamp_millis(), 1700000000001);
}

#[test]
fn test_initialize_on_unreadable_storage_is_empty() {
    let mut store = HistoryStore::new(BrokenStore);
    assert!(store.initialize().is_empty());
}

#[test]
fn test_add_prepends_newest_first() {
    let mut store = setup();
    store.add("data:image/png;base64,AAA").unwrap();
    let list = store.add("data:image/png;base64,BBB").unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].encoded_image, "data:image/png;base64,BBB");
    assert_eq!(list[1].encoded_image, "data:image/png;base64,AAA");
    assert!(list[0].id > list[1].id);
}

#[test]
fn test_add_at_capacity_evicts_exactly_the_oldest() {
    let mut store = setup();
    let mut first_id = None;
    for i in 0..MAX_HISTORY_ITEMS {
        let list = store.add(&format!("data:image/png;base64,{}", i)).unwrap();
        if i == 0 {
            first_id = Some(list[0].id);
        }
    }
    let second_id = store.list()[MAX_HISTORY_ITEMS - 2].id;

    let list = store.add("data:image/png;base64,NEW").unwrap();

    assert_eq!(list.len(), MAX_HISTORY_ITEMS);
    assert_eq!(list[0].encoded_image, "data:image/png;base64,NEW");
    assert!(list.iter().all(|r| Some(r.id) != first_id));
    assert_eq!(list[MAX_HISTORY_ITEMS - 1].id, second_id);
}

#[rstest]
#[case("")]
#[case("AAA")]
#[case("https://example.com/crop.png")]
#[case("data:image/png;base64")]
fn test_add_rejects_non_data_urls(#[case] input: &str) {
    let mut store = setup();
    let result = store.add(input);

    assert!(matches!(result, Err(HistoryError::InvalidImage(_))));
    assert!(store.list().is_empty());
    assert!(!store.storage().contains_key(HISTORY_KEY));
}

#[test]
fn test_add_writes_mirror_with_wire_field_names() {
    let mut store = setup();
    store.add("data:image/png;base64,AAA").unwrap();

    let raw = store.storage().get_item(HISTORY_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value.as_array().unwrap()[0];

    assert!(entry["id"].is_i64());
    assert_eq!(entry["src"], "data:image/png;base64,AAA");
    assert!(entry["timestamp"].as_str().unwrap().ends_with('Z'));
    assert_eq!(
        store.last_persist(),
        PersistOutcome::Saved {
            kept: 1,
            evicted: 0
        }
    );
}

#[test]
fn test_remove_present_id() {
    let mut store = setup();
    store.add("data:image/png;base64,AAA").unwrap();
    let list = store.add("data:image/png;base64,BBB").unwrap();
    let target = list[1].id;

    let list = store.remove(target);

    assert_eq!(list.len(), 1);
    assert!(list.iter().all(|r| r.id != target));
    let reloaded = reload(store);
    assert!(reloaded.list().iter().all(|r| r.id != target));
}

#[test]
fn test_remove_absent_id_is_noop() {
    let mut store = setup();
    store.add("data:image/png;base64,AAA").unwrap();
    let before: HistoryList = store.list().to_vec();

    let after = store.remove(-42);

    assert_eq!(before, after);
}

#[test]
fn test_clear_deletes_persisted_key() {
    let mut store = setup();
    store.add("data:image/png;base64,AAA").unwrap();
    assert!(store.storage().contains_key(HISTORY_KEY));

    let list = store.clear();

    assert!(list.is_empty());
    assert!(store.list().is_empty());
    assert!(!store.storage().contains_key(HISTORY_KEY));
    assert_eq!(store.last_persist(), PersistOutcome::Removed);
    assert!(reload(store).list().is_empty());
}

#[test]
fn test_clear_on_empty_history_is_noop() {
    let mut store = setup();
    assert!(store.clear().is_empty());
    assert!(store.storage().is_empty());
}

#[test]
fn test_end_to_end_example() {
    let mut store = setup();

    let list = store.add("data:image/png;base64,AAA").unwrap();
    assert_eq!(list.len(), 1);
    let t1 = list[0].id;

    let list = store.add("data:image/png;base64,BBB").unwrap();
    let t2 = list[0].id;
    assert_eq!(
        list.iter().map(|r| (r.id, r.encoded_image.as_str())).collect::<Vec<_>>(),
        vec![
            (t2, "data:image/png;base64,BBB"),
            (t1, "data:image/png;base64,AAA")
        ]
    );

    let list = store.remove(t1);
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, t2);

    assert!(store.clear().is_empty());
    assert_eq!(store.storage().get_item(HISTORY_KEY).unwrap(), None);
}

#[test]
fn test_quota_eviction_mirrors_persisted_list_by_default() {
    // Each record serializes to roughly 1.1 KB; five fit, six do not.
    let mut store = HistoryStore::new(MemoryStore::with_quota(6_000));
    store.initialize();

    let mut list = Vec::new();
    for tag in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'] {
        list = store.add(&image_of_size(tag, 1_000)).unwrap();
    }

    let persisted = store.storage().get_item(HISTORY_KEY).unwrap().unwrap();
    assert!(persisted.len() + HISTORY_KEY.len() <= 6_000);
    let persisted: HistoryList = serde_json::from_str(&persisted).unwrap();

    assert_eq!(list, persisted);
    assert_eq!(store.list(), persisted.as_slice());
    assert!(list.len() < 8);
    assert!(list[0].encoded_image.ends_with('h'));
    assert!(matches!(
        store.last_persist(),
        PersistOutcome::Saved { evicted, .. } if evicted >= 1
    ));
}

#[test]
fn test_quota_eviction_keeps_session_list_when_configured() {
    let mut store = HistoryStore::with_consistency(
        MemoryStore::with_quota(6_000),
        HistoryConsistency::KeepSession,
    );
    store.initialize();

    for (i, tag) in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'].into_iter().enumerate() {
        let list = store.add(&image_of_size(tag, 1_000)).unwrap();
        assert_eq!(list.len(), (i + 1).min(MAX_HISTORY_ITEMS));
    }

    let persisted: HistoryList =
        serde_json::from_str(&store.storage().get_item(HISTORY_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(store.list().len(), 8);
    assert!(persisted.len() < 8);
    // The persisted copy is the newest prefix of the session list.
    assert_eq!(&store.list()[..persisted.len()], persisted.as_slice());

    let reloaded = reload(store);
    assert_eq!(reloaded.list(), persisted.as_slice());
}

#[rstest]
#[case(HistoryConsistency::MirrorPersisted, 0)]
#[case(HistoryConsistency::KeepSession, 1)]
fn test_record_larger_than_quota_persists_empty_list(
    #[case] consistency: HistoryConsistency,
    #[case] expected_len: usize,
) {
    let mut store = HistoryStore::with_consistency(MemoryStore::with_quota(100), consistency);
    store.initialize();

    let list = store.add(&image_of_size('x', 500)).unwrap();

    assert_eq!(list.len(), expected_len);
    assert_eq!(store.list().len(), expected_len);
    // The loop shrinks to an empty list, which fits, so `[]` is persisted.
    assert_eq!(
        store.storage().get_item(HISTORY_KEY).unwrap().as_deref(),
        Some("[]")
    );
    assert_eq!(
        store.last_persist(),
        PersistOutcome::Saved {
            kept: 0,
            evicted: 1
        }
    );
}

#[test]
fn test_quota_too_small_for_empty_list_abandons() {
    let mut store = HistoryStore::new(MemoryStore::with_quota(4));
    store.initialize();

    let list = store.add("data:image/png;base64,AAA").unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(store.last_persist(), PersistOutcome::Abandoned);
    assert!(!store.storage().contains_key(HISTORY_KEY));
}

#[test]
fn test_non_quota_failure_is_silent() {
    let mut store = HistoryStore::new(BrokenStore);
    store.initialize();

    let list = store.add("data:image/png;base64,AAA").unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(store.last_persist(), PersistOutcome::Abandoned);

    let list = store.remove(list[0].id);
    assert!(list.is_empty());

    assert!(store.clear().is_empty());
    assert_eq!(store.last_persist(), PersistOutcome::Abandoned);
}

#[test]
fn test_add_after_loading_largest_possible_id() {
    let raw = format!(
        r#"[{{"id": {}, "src": "data:image/png;base64,AAA", "timestamp": "2024-01-01T00:00:00Z"}}]"#,
        i64::MAX
    );
    let mut storage = MemoryStore::new();
    storage.set_item(HISTORY_KEY, &raw).unwrap();
    let mut store = HistoryStore::new(storage);
    store.initialize();

    store.add("data:image/png;base64,BBB").unwrap();
    let list = store.add("data:image/png;base64,CCC").unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(list[2].id, i64::MAX);
    let mut ids: Vec<i64> = list.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 3, "ids must stay unique: {:?}", ids);

    let reloaded = reload(store);
    assert_eq!(reloaded.list(), list.as_slice());
}

#[test]
fn test_quota_eviction_with_sqlite_store() {
    let storage = SqliteStore::open_in_memory(Some(6_000)).unwrap();
    let mut store = HistoryStore::new(storage);
    store.initialize();

    let mut list = Vec::new();
    for tag in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'] {
        list = store.add(&image_of_size(tag, 1_000)).unwrap();
    }

    assert_eq!(list.len(), 5);
    assert!(list[0].encoded_image.ends_with('h'));
    assert!(list[4].encoded_image.ends_with('d'));
    assert!(store.storage().used_bytes().unwrap() <= 6_000);
    assert_eq!(
        store.last_persist(),
        PersistOutcome::Saved {
            kept: 5,
            evicted: 1
        }
    );

    let reloaded = reload(store);
    assert_eq!(reloaded.list(), list.as_slice());
}

#[test]
fn test_remove_while_session_exceeds_quota() {
    let mut store = HistoryStore::with_consistency(
        MemoryStore::with_quota(6_000),
        HistoryConsistency::KeepSession,
    );
    store.initialize();
    for tag in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'] {
        store.add(&image_of_size(tag, 1_000)).unwrap();
    }
    let newest = store.list()[0].id;

    let list = store.remove(newest);

    // Seven records remain in the session; only five fit the budget.
    assert_eq!(list.len(), 7);
    assert!(list.iter().all(|r| r.id != newest));
    assert_eq!(
        store.last_persist(),
        PersistOutcome::Saved {
            kept: 5,
            evicted: 2
        }
    );
    let persisted: HistoryList =
        serde_json::from_str(&store.storage().get_item(HISTORY_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(persisted.as_slice(), &list[..5]);
}

#[test]
fn test_remove_after_eviction_fits_without_further_eviction() {
    let mut store = HistoryStore::new(MemoryStore::with_quota(6_000));
    store.initialize();
    for tag in ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'] {
        store.add(&image_of_size(tag, 1_000)).unwrap();
    }
    let oldest = store.list()[4].id;

    let list = store.remove(oldest);

    assert_eq!(list.len(), 4);
    assert_eq!(
        store.last_persist(),
        PersistOutcome::Saved {
            kept: 4,
            evicted: 0
        }
    );
    assert_eq!(reload(store).list(), list.as_slice());
}
