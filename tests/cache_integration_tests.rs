//! Integration Tests for the Cache
//!
//! Exercises the public API end to end: janitor lifecycle, eviction
//! callbacks, concurrent access and snapshot files.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use mini_cache::cache::MockClock;
use mini_cache::{Cache, CacheConfig, CacheError, Item, Ttl, Value};
use tokio_test::{assert_err, assert_ok};

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn recording_callback() -> (
    Arc<Mutex<Vec<(String, Value)>>>,
    impl Fn(&str, &Value) + Send + Sync + 'static,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback = move |key: &str, value: &Value| {
        sink.lock().unwrap().push((key.to_string(), value.clone()));
    };
    (seen, callback)
}

// == Janitor ==

#[tokio::test]
async fn test_janitor_sweeps_expired_items() {
    init_tracing();
    let (seen, callback) = recording_callback();
    let config = CacheConfig::default()
        .with_cleanup_interval(Duration::from_millis(20))
        .with_eviction_callback(callback);
    let cache = Cache::new(config).unwrap();

    cache.set("short", 1i64, Ttl::After(Duration::from_millis(10)));
    cache.set("long", 2i64, Ttl::After(Duration::from_secs(60)));

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert_eq!(cache.item_count(), 1);
    assert_eq!(*seen.lock().unwrap(), vec![("short".to_string(), Value::I64(1))]);
    assert!(cache.stats().expirations >= 1);
}

#[tokio::test]
async fn test_janitor_enforces_size_bound() {
    init_tracing();
    let config = CacheConfig::default()
        .with_cleanup_interval(Duration::from_millis(200))
        .with_size_bound(3);
    let cache = Cache::new(config).unwrap();

    for i in 0..10 {
        cache.set(format!("key{}", i), i as i64, Ttl::Never);
        // Distinct access stamps on coarse clocks
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(cache.item_count(), 3);
    for i in 7..10 {
        assert!(cache.get(&format!("key{}", i)).is_some());
    }
}

#[test]
fn test_size_bound_is_soft() {
    let cache = Cache::new(CacheConfig::default().with_size_bound(3)).unwrap();

    for i in 0..10 {
        cache.set(format!("key{}", i), i as i64, Ttl::Never);
    }

    // Writes are never refused; only a sweep restores the bound
    assert_eq!(cache.item_count(), 10);
    assert_eq!(cache.delete_lru(), 7);
    assert_eq!(cache.item_count(), 3);
}

#[tokio::test]
async fn test_janitor_runs_until_stopped() {
    let config = CacheConfig::default().with_cleanup_interval(Duration::from_millis(10));
    let cache = Arc::new(Cache::new(config).unwrap());
    let other = cache.clone();

    drop(cache);
    // Still referenced, so still running
    assert!(other.janitor_running());

    other.stop_janitor();
    // The task only exits once it is polled again
    assert!(other.janitor_running());

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!other.janitor_running());
}

// == Conditional writes and numbers ==

#[test]
fn test_add_and_replace() {
    let clock = MockClock::new();
    let cache = Cache::with_clock(CacheConfig::default(), Arc::new(clock.clone())).unwrap();

    assert_ok!(cache.add("k", "v1", Ttl::After(Duration::from_secs(1))));
    assert_err!(cache.add("k", "v2", Ttl::Default));
    assert_ok!(cache.replace("k", "v3", Ttl::After(Duration::from_secs(1))));
    assert_eq!(cache.get("k"), Some(Value::from("v3")));

    clock.advance(Duration::from_secs(2));
    assert!(matches!(
        cache.replace("k", "v4", Ttl::Default),
        Err(CacheError::NotFound(_))
    ));
    assert_ok!(cache.add("k", "v5", Ttl::Default));
}

#[test]
fn test_increment_scenarios() {
    let cache = Cache::new(CacheConfig::default()).unwrap();

    cache.set("x", 10i64, Ttl::Never);
    assert_eq!(cache.increment("x", 5).unwrap(), Value::I64(15));

    cache.set("x", "ten", Ttl::Never);
    assert!(matches!(
        cache.increment("x", 5),
        Err(CacheError::WrongType { .. })
    ));
}

// == Eviction callback ==

#[test]
fn test_manual_lru_scenario() {
    let clock = MockClock::new();
    let (seen, callback) = recording_callback();
    let config = CacheConfig::default()
        .with_size_bound(3)
        .with_eviction_callback(callback);
    let cache = Cache::with_clock(config, Arc::new(clock.clone())).unwrap();

    for key in ["a", "b", "c", "d"] {
        cache.set(key, key, Ttl::Never);
        clock.advance(Duration::from_millis(1));
    }

    assert_eq!(cache.delete_lru(), 1);
    assert_eq!(cache.get("a"), None);
    assert_eq!(*seen.lock().unwrap(), vec![("a".to_string(), Value::from("a"))]);
}

#[test]
fn test_callback_may_reenter_cache() {
    let clock = MockClock::new();
    let cache_slot: Arc<Mutex<Option<Arc<Cache>>>> = Arc::new(Mutex::new(None));
    let slot = cache_slot.clone();
    let config = CacheConfig::default().with_eviction_callback(move |key, _| {
        let cache = slot.lock().unwrap().clone();
        if let Some(cache) = cache {
            // The removed key is already gone when the callback runs
            assert_eq!(cache.get(key), None);
            cache.set(format!("evicted:{}", key), true, Ttl::Never);
        }
    });
    let cache = Arc::new(Cache::with_clock(config, Arc::new(clock.clone())).unwrap());
    *cache_slot.lock().unwrap() = Some(cache.clone());

    cache.set("a", 1i64, Ttl::After(Duration::from_secs(1)));
    clock.advance(Duration::from_secs(2));
    assert_eq!(cache.delete_expired(), 1);

    assert_eq!(cache.get("evicted:a"), Some(Value::Bool(true)));
    // Break the reference cycle
    cache_slot.lock().unwrap().take();
}

// == Concurrency ==

#[test]
fn test_concurrent_access() {
    let cache = Arc::new(Cache::new(CacheConfig::default().with_size_bound(10_000)).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            thread::spawn(move || {
                for j in 0..200 {
                    let key = format!("key-{}-{}", i, j);
                    cache.set(key.clone(), j as i64, Ttl::Never);
                    assert_eq!(cache.get(&key), Some(Value::I64(j as i64)));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.item_count(), 1600);
}

// == Snapshots ==

#[test]
fn test_snapshot_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.json");

    let source = Cache::new(CacheConfig::default()).unwrap();
    source.set("int", 42i64, Ttl::Never);
    source.set("text", "hello", Ttl::After(Duration::from_secs(600)));
    source.set("json", serde_json::json!({"nested": [1, 2]}), Ttl::Never);
    source.save_file(&path).unwrap();

    let target = Cache::new(CacheConfig::default()).unwrap();
    assert_eq!(target.load_file(&path).unwrap(), 3);

    assert_eq!(target.items(), source.items());
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::new(CacheConfig::default()).unwrap();

    let result = cache.load_file(dir.path().join("missing.json"));
    assert!(matches!(result, Err(CacheError::Io(_))));
}

#[test]
fn test_initial_items_are_visible() {
    let mut initial = HashMap::new();
    initial.insert("seed".to_string(), Item::new(7u16));

    let cache = Cache::new(CacheConfig::default().with_initial_items(initial)).unwrap();

    assert_eq!(cache.increment_by("seed", 1u16).unwrap(), 8);
}
