//! Configuration Module
//!
//! Cache settings consumed at construction, plus the per-write TTL choice.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Item, Value};

/// Hook invoked with each removed key and value.
pub type EvictionCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

// == TTL ==
/// Expiration requested by a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the cache's configured default TTL
    #[default]
    Default,
    /// Never expire, whatever the default TTL is
    Never,
    /// Expire after the given duration
    After(Duration),
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::After(duration)
    }
}

/// Cache configuration parameters.
///
/// Defaults: items never expire, no janitor, no size bound, no callback.
#[derive(Clone, Default)]
pub struct CacheConfig {
    /// TTL applied by writes using `Ttl::Default`, None = never expire
    pub default_ttl: Option<Duration>,
    /// Janitor sweep period, zero disables the janitor
    pub cleanup_interval: Duration,
    /// Soft item-count ceiling restored by the janitor, 0 = unbounded
    pub size_bound: usize,
    /// Invoked after an item is deleted, expired or evicted
    pub eviction_callback: Option<EvictionCallback>,
    /// Entries present from construction
    pub initial_items: HashMap<String, Item>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds, 0 = never (default: 0)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Janitor period in milliseconds, 0 = off (default: 0)
    /// - `CACHE_SIZE_BOUND` - Soft item-count bound, 0 = unbounded (default: 0)
    pub fn from_env() -> Self {
        let default_ttl_ms: u64 = env_or("CACHE_DEFAULT_TTL_MS", 0);
        Self {
            default_ttl: (default_ttl_ms > 0).then(|| Duration::from_millis(default_ttl_ms)),
            cleanup_interval: Duration::from_millis(env_or("CACHE_CLEANUP_INTERVAL_MS", 0)),
            size_bound: env_or("CACHE_SIZE_BOUND", 0),
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_size_bound(mut self, size_bound: usize) -> Self {
        self.size_bound = size_bound;
        self
    }

    pub fn with_eviction_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.eviction_callback = Some(Arc::new(callback));
        self
    }

    pub fn with_initial_items(mut self, items: HashMap<String, Item>) -> Self {
        self.initial_items = items;
        self
    }

    /// Resolves a per-write TTL into a concrete duration, None = never.
    pub(crate) fn resolve_ttl(&self, ttl: Ttl) -> Option<Duration> {
        match ttl {
            Ttl::Default => self.default_ttl,
            Ttl::Never => None,
            Ttl::After(duration) => Some(duration),
        }
    }
}

impl fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheConfig")
            .field("default_ttl", &self.default_ttl)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("size_bound", &self.size_bound)
            .field("eviction_callback", &self.eviction_callback.is_some())
            .field("initial_items", &self.initial_items.len())
            .finish()
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
