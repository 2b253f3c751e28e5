use std::time::Duration;

use tempfile::TempDir;

use crate::engine::core::buffer::BufferStore;
use crate::engine::core::key::Key;
use crate::engine::errors::StoreError;

const NO_TTL: Duration = Duration::ZERO;

#[test]
fn append_then_range_observes_the_entry() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();

    let key = Key::new("p", 42);
    store.append(key, b"payload", NO_TTL).unwrap();

    let mut seen = Vec::new();
    store
        .range(Key::first(), Key::last(), |k, v| {
            seen.push((*k, v.to_vec()));
            false
        })
        .unwrap();

    assert_eq!(vec![(key, b"payload".to_vec())], seen);
}

#[test]
fn last_writer_wins_per_key() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();

    let key = Key::new("p", 1);
    store.append(key, b"first", NO_TTL).unwrap();
    store.append(key, b"second", NO_TTL).unwrap();

    let mut value = Vec::new();
    store
        .range(Key::first(), Key::last(), |_, v| {
            value = v.to_vec();
            true
        })
        .unwrap();
    assert_eq!(b"second".to_vec(), value);
    assert_eq!(1, store.len());
}

#[test]
fn range_visits_keys_in_hash_then_time_order() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();

    // 100 records across 3 partitions at pseudo-random timestamps.
    for i in 0..100u64 {
        let partition = match i % 3 {
            0 => "alpha",
            1 => "beta",
            _ => "gamma",
        };
        let nanos = ((i * 2_654_435_761) % 1_000_000) as i64;
        let key = Key::new(partition, nanos);
        store.append(key, &i.to_be_bytes(), NO_TTL).unwrap();
    }

    let mut visited = Vec::new();
    store
        .range(Key::first(), Key::last(), |k, _| {
            visited.push(*k);
            false
        })
        .unwrap();

    assert_eq!(100, visited.len());
    // Lexicographic over the whole scan.
    for pair in visited.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    // Equal-hash runs are contiguous: each hash appears in exactly one run.
    let hashes: Vec<u64> = visited.iter().map(|k| Key::hash_of(k.as_bytes())).collect();
    let mut seen_runs = std::collections::HashSet::new();
    let mut previous = None;
    for hash in &hashes {
        if previous != Some(*hash) {
            assert!(seen_runs.insert(*hash), "hash runs must be contiguous");
            previous = Some(*hash);
        }
    }
    assert_eq!(3, seen_runs.len());
    // Within a run, sort timestamps ascend.
    for pair in visited.windows(2) {
        if Key::hash_of(pair[0].as_bytes()) == Key::hash_of(pair[1].as_bytes()) {
            assert!(pair[0].sort_of() <= pair[1].sort_of());
        }
    }
}

#[test]
fn range_stops_when_callback_returns_true() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();

    for i in 0..10 {
        store.append(Key::new("p", i), b"v", NO_TTL).unwrap();
    }

    let mut count = 0;
    store
        .range(Key::first(), Key::last(), |_, _| {
            count += 1;
            count == 3
        })
        .unwrap();
    assert_eq!(3, count);
}

#[test]
fn delete_removes_keys_in_bulk() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();

    let keys: Vec<Key> = (0..2000).map(|i| Key::new("p", i)).collect();
    for key in &keys {
        store.append(*key, b"v", NO_TTL).unwrap();
    }
    assert_eq!(2000, store.len());

    // Larger than one commit batch: chunking must be transparent.
    store.delete(&keys).unwrap();
    assert!(store.is_empty());
}

#[test]
fn expired_entries_vanish_after_gc() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();

    let expiring = Key::new("p", 1);
    let durable = Key::new("p", 2);
    store
        .append(expiring, b"short-lived", Duration::from_secs(1))
        .unwrap();
    store.append(durable, b"stays", NO_TTL).unwrap();

    std::thread::sleep(Duration::from_secs(2));
    store.gc_once().unwrap();

    let mut seen = Vec::new();
    store
        .range(Key::first(), Key::last(), |k, _| {
            seen.push(*k);
            false
        })
        .unwrap();
    assert_eq!(vec![durable], seen);
}

#[test]
fn reopen_recovers_surviving_entries() {
    let dir = TempDir::new().unwrap();
    let key = Key::new("p", 5);

    {
        let store = BufferStore::open(dir.path()).unwrap();
        store.append(key, b"durable", NO_TTL).unwrap();
    }

    let store = BufferStore::open(dir.path()).unwrap();
    let mut value = Vec::new();
    store
        .range(Key::first(), Key::last(), |_, v| {
            value = v.to_vec();
            true
        })
        .unwrap();
    assert_eq!(b"durable".to_vec(), value);
}

#[tokio::test]
async fn operations_fail_after_close() {
    let dir = TempDir::new().unwrap();
    let store = BufferStore::open(dir.path()).unwrap();
    store.close().await.unwrap();

    let key = Key::new("p", 1);
    assert!(matches!(
        store.append(key, b"v", NO_TTL),
        Err(StoreError::Closed)
    ));
    assert!(matches!(
        store.range(Key::first(), Key::last(), |_, _| false),
        Err(StoreError::Closed)
    ));
    assert!(matches!(store.delete(&[key]), Err(StoreError::Closed)));

    // Close is idempotent.
    store.close().await.unwrap();
}
