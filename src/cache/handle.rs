//! Cache Handle Module
//!
//! Owning handle that ties the janitor's lifetime to the cache.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::cache::{CacheStore, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::tasks::{spawn_janitor, Janitor};

// == Cache ==
/// A concurrent TTL cache with an optional background janitor.
///
/// All item operations are available through `Deref` to [`CacheStore`].
/// Share a cache between threads or tasks by wrapping it in an `Arc`;
/// dropping the last reference stops the janitor.
///
/// ```
/// use std::time::Duration;
/// use mini_cache::{Cache, CacheConfig, Ttl, Value};
///
/// let cache = Cache::new(CacheConfig::default()).unwrap();
/// cache.set("greeting", "hello", Ttl::After(Duration::from_secs(60)));
/// assert_eq!(cache.get("greeting"), Some(Value::from("hello")));
/// ```
#[derive(Debug)]
pub struct Cache {
    store: Arc<CacheStore>,
    janitor: Mutex<Option<Janitor>>,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache using the system clock.
    ///
    /// # Errors
    /// A nonzero `cleanup_interval` starts the janitor, which requires a
    /// Tokio runtime; without one this returns `CacheError::NoRuntime`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache driven by the given clock.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let cleanup_interval = config.cleanup_interval;
        let store = Arc::new(CacheStore::new(config, clock));

        let janitor = if cleanup_interval.is_zero() {
            None
        } else {
            Some(spawn_janitor(Arc::downgrade(&store), cleanup_interval)?)
        };

        Ok(Self {
            store,
            janitor: Mutex::new(janitor),
        })
    }

    // == Janitor Control ==
    /// Stops the janitor. Stopping is permanent; calling this twice is harmless.
    ///
    /// The task exits at its next wake-up, so `janitor_running` may still
    /// report true for a moment after this returns.
    pub fn stop_janitor(&self) {
        if let Some(janitor) = self.janitor.lock().as_mut() {
            if janitor.stop() {
                info!("Janitor stop requested");
            }
        }
    }

    /// Returns true while a janitor task is attached and has not exited.
    pub fn janitor_running(&self) -> bool {
        self.janitor
            .lock()
            .as_ref()
            .map(|janitor| !janitor.is_finished())
            .unwrap_or(false)
    }
}

impl Deref for Cache {
    type Target = CacheStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl Drop for Cache {
    fn drop(&mut self) {
        if let Some(janitor) = self.janitor.get_mut().as_mut() {
            janitor.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MockClock, Value};
    use crate::config::Ttl;
    use crate::error::CacheError;
    use std::time::Duration;

    #[test]
    fn test_cache_without_janitor() {
        let cache = Cache::new(CacheConfig::default()).unwrap();

        cache.set("k", 1i64, Ttl::Default);
        assert_eq!(cache.get("k"), Some(Value::I64(1)));
        assert!(!cache.janitor_running());
    }

    #[test]
    fn test_cache_janitor_requires_runtime() {
        let config = CacheConfig::default().with_cleanup_interval(Duration::from_millis(10));
        assert!(matches!(Cache::new(config), Err(CacheError::NoRuntime)));
    }

    #[test]
    fn test_never_expire_survives_far_future() {
        let clock = MockClock::new();
        let cache = Cache::with_clock(CacheConfig::default(), Arc::new(clock.clone())).unwrap();

        cache.set("k", "v", Ttl::Never);
        clock.advance(Duration::from_secs(50 * 365 * 24 * 3600));

        assert_eq!(cache.get("k"), Some(Value::from("v")));
    }

    #[tokio::test]
    async fn test_cache_janitor_lifecycle() {
        let config = CacheConfig::default().with_cleanup_interval(Duration::from_millis(10));
        let cache = Cache::new(config).unwrap();
        assert!(cache.janitor_running());

        cache.stop_janitor();
        // Not polled since the stop request, so the task is still alive
        assert!(cache.janitor_running());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!cache.janitor_running());
        assert!(cache.janitor.lock().is_some());
        cache.stop_janitor();
    }

    #[tokio::test]
    async fn test_drop_stops_janitor() {
        let clock = MockClock::new();
        let config = CacheConfig::default().with_cleanup_interval(Duration::from_millis(10));
        let cache = Cache::with_clock(config, Arc::new(clock.clone())).unwrap();
        // Outlives the cache, so only the stop signal can end the task
        let store = cache.store.clone();
        assert_eq!(Arc::weak_count(&store), 1);

        drop(cache);
        tokio::time::sleep(Duration::from_millis(50)).await;
        // The exited task released its weak reference
        assert_eq!(Arc::weak_count(&store), 0);

        store.set("k", 1i64, Ttl::After(Duration::from_millis(1)));
        clock.advance(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.item_count(), 1, "No sweep runs after drop");
    }
}
