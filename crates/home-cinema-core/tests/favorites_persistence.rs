// SPDX-License-Identifier: AGPL-3.0
// Favorites store against real and misbehaving key-value backends

use home_cinema_core::{
    AppError, FavoritesEvent, FavoritesStore, FileKeyValueStore, KeyValueStore, LoadState,
    MemoryKeyValueStore, MovieId, FAVORITES_KEY,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn ids(raw: &[u64]) -> Vec<MovieId> {
    raw.iter().copied().map(MovieId).collect()
}

fn persisted(kv: &dyn KeyValueStore) -> Option<Vec<MovieId>> {
    kv.get(FAVORITES_KEY)
        .expect("read")
        .map(|raw| serde_json::from_str(&raw).expect("valid record"))
}

/// Store whose writes can be switched to fail
#[derive(Default)]
struct FlakyStore {
    inner: MemoryKeyValueStore,
    fail_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::PersistenceWrite("disk full".to_string()));
        }
        self.inner.set(key, value)
    }
}

/// Store whose earlier writes take longer than later ones
#[derive(Default)]
struct SlowStore {
    writes: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl KeyValueStore for SlowStore {
    fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
        Ok(self.writes.lock().expect("lock").last().cloned())
    }

    fn set(&self, _key: &str, value: &str) -> Result<(), AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30u64.saturating_sub(call as u64 * 10)));
        self.writes.lock().expect("lock").push(value.to_string());
        Ok(())
    }
}

struct UnreadableStore;

impl KeyValueStore for UnreadableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
        Err(AppError::PersistenceRead("permission denied".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), AppError> {
        Ok(())
    }
}

#[tokio::test]
async fn load_existing_record_preserves_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let kv = Arc::new(FileKeyValueStore::open(dir.path()).expect("open"));
    kv.set(FAVORITES_KEY, "[1,2]").expect("seed");

    let store = FavoritesStore::new(kv.clone()).expect("store");
    let loaded = store.load().await.expect("load");

    assert_eq!(loaded, ids(&[1, 2]));
    assert_eq!(store.list(), ids(&[1, 2]));
    assert_eq!(store.state(), LoadState::Ready);
}

#[tokio::test]
async fn add_then_persist_then_reload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let kv = Arc::new(FileKeyValueStore::open(dir.path()).expect("open"));
    kv.set(FAVORITES_KEY, "[1,2]").expect("seed");

    let store = FavoritesStore::new(kv.clone()).expect("store");
    store.load().await.expect("load");

    assert!(store.add_favorite(MovieId(3)));
    assert_eq!(store.list(), ids(&[1, 2, 3]));

    store.flush().await;
    assert_eq!(persisted(&*kv), Some(ids(&[1, 2, 3])));

    // Adding an existing id must not create a second entry
    assert!(!store.add_favorite(MovieId(2)));
    assert_eq!(store.list(), ids(&[1, 2, 3]));

    // Removing an absent id changes nothing
    assert!(!store.remove_favorite(MovieId(99)));
    assert_eq!(store.list(), ids(&[1, 2, 3]));

    store.flush().await;
    let reopened = FavoritesStore::new(kv.clone()).expect("store");
    assert_eq!(reopened.load().await.expect("reload"), ids(&[1, 2, 3]));
}

#[tokio::test]
async fn absent_removal_skips_the_write() {
    let kv = Arc::new(MemoryKeyValueStore::with_entry(FAVORITES_KEY, "[1,2,3]"));
    let store = FavoritesStore::new(kv.clone()).expect("store");
    store.load().await.expect("load");

    let mut events = store.subscribe();
    store.remove_favorite(MovieId(99));
    store.flush().await;

    assert!(events.try_recv().is_err());
    assert_eq!(persisted(&*kv), Some(ids(&[1, 2, 3])));
}

#[tokio::test]
async fn failed_write_keeps_in_memory_change() {
    let kv = Arc::new(FlakyStore::default());
    kv.inner.set(FAVORITES_KEY, "[1,2,3]").expect("seed");

    let store = FavoritesStore::new(kv.clone()).expect("store");
    store.load().await.expect("load");
    let mut events = store.subscribe();

    kv.fail_writes.store(true, Ordering::SeqCst);
    assert!(store.add_favorite(MovieId(4)));
    store.flush().await;

    assert_eq!(store.list(), ids(&[1, 2, 3, 4]));
    assert!(store.is_favorite(MovieId(4)));
    assert_eq!(persisted(&*kv), Some(ids(&[1, 2, 3])));

    let mut failures = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let FavoritesEvent::PersistFailed { error } = event {
            failures.push(error);
        }
    }
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("disk full"));

    // The next successful write brings the record back in line
    kv.fail_writes.store(false, Ordering::SeqCst);
    store.remove_favorite(MovieId(1));
    store.flush().await;
    assert_eq!(persisted(&*kv), Some(ids(&[2, 3, 4])));
}

#[tokio::test]
async fn membership_holds_regardless_of_persistence() {
    let kv = Arc::new(FlakyStore::default());
    kv.fail_writes.store(true, Ordering::SeqCst);
    let store = FavoritesStore::new(kv).expect("store");
    store.load().await.expect("load");

    store.add_favorite(MovieId(7));
    assert!(store.is_favorite(MovieId(7)));
    store.remove_favorite(MovieId(7));
    assert!(!store.is_favorite(MovieId(7)));
}

#[tokio::test]
async fn rapid_writes_land_in_issue_order() {
    let kv = Arc::new(SlowStore::default());
    let store = FavoritesStore::new(kv.clone()).expect("store");
    store.load().await.expect("load");

    store.add_favorite(MovieId(1));
    store.add_favorite(MovieId(2));
    store.remove_favorite(MovieId(1));
    store.add_favorite(MovieId(3));
    store.flush().await;

    let writes = kv.writes.lock().expect("lock").clone();
    assert_eq!(writes, vec!["[1]", "[1,2]", "[2]", "[2,3]"]);
}

#[tokio::test]
async fn corrupt_record_fails_load() {
    let kv = Arc::new(MemoryKeyValueStore::with_entry(FAVORITES_KEY, "[1, 2"));
    let store = FavoritesStore::new(kv).expect("store");

    let err = store.load().await.expect_err("corrupt record");
    assert!(matches!(err, AppError::PersistenceCorrupt(_)));
    assert_eq!(store.state(), LoadState::Uninitialized);
}

#[tokio::test]
async fn corrupt_record_resets_on_startup_load() {
    let kv = Arc::new(MemoryKeyValueStore::with_entry(FAVORITES_KEY, "oops"));
    let store = FavoritesStore::new(kv.clone()).expect("store");

    assert_eq!(store.load_or_reset().await.expect("reset"), Vec::<MovieId>::new());
    assert_eq!(store.state(), LoadState::Ready);

    store.add_favorite(MovieId(5));
    store.flush().await;
    assert_eq!(persisted(&*kv), Some(ids(&[5])));
}

#[tokio::test]
async fn read_failure_propagates_even_when_resetting() {
    let store = FavoritesStore::new(Arc::new(UnreadableStore)).expect("store");
    let err = store.load_or_reset().await.expect_err("unreadable");
    assert!(matches!(err, AppError::PersistenceRead(_)));
}

#[tokio::test]
async fn custom_key_is_isolated() {
    let kv = Arc::new(MemoryKeyValueStore::new());
    let store = FavoritesStore::with_key(kv.clone(), "watchlist").expect("store");
    store.load().await.expect("load");
    store.add_favorite(MovieId(11));
    store.flush().await;

    assert_eq!(kv.get(FAVORITES_KEY).expect("read"), None);
    assert_eq!(kv.get("watchlist").expect("read").as_deref(), Some("[11]"));
}

#[tokio::test]
async fn mutation_before_load_keeps_saved_record() {
    let kv = Arc::new(MemoryKeyValueStore::with_entry(FAVORITES_KEY, "[1, 2]"));
    let store = FavoritesStore::new(kv.clone()).expect("store");

    assert!(store.add_favorite(MovieId(5)));
    store.flush().await;
    assert_eq!(persisted(&*kv), Some(ids(&[1, 2])));

    assert_eq!(store.load().await.expect("load"), ids(&[1, 2]));
    assert!(!store.is_favorite(MovieId(5)));

    store.add_favorite(MovieId(5));
    store.flush().await;
    assert_eq!(persisted(&*kv), Some(ids(&[1, 2, 5])));
}
