//! Cache Store Module
//!
//! Concurrent map from key to item, with lazy expiration on read and the
//! expiration sweep. Per-key operations rely on the map's shard locks; the
//! settings lock is only taken exclusively by `flush` and `configure`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::cache::clock::duration_nanos;
use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, Clock, Item, Value};
use crate::config::{CacheConfig, EvictionCallback, Ttl};
use crate::error::{CacheError, Result};

/// A removed key and the value it held.
pub(crate) type Removed = (String, Value);

// == Cache Store ==
/// Concurrent item storage with TTL expiration and approximate LRU eviction.
///
/// Normally reached through [`Cache`](crate::cache::Cache), which also owns
/// the background janitor.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-item storage
    pub(crate) items: DashMap<String, Item>,
    /// Live settings, written only by `flush` and `configure`
    pub(crate) settings: RwLock<CacheConfig>,
    /// Lookup and removal counters
    pub(crate) stats: StatsRecorder,
    /// Time source for expiration and access stamps
    pub(crate) clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store seeded with the config's initial items.
    pub fn new(mut config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let items: DashMap<String, Item> = config.initial_items.drain().collect();
        Self {
            items,
            settings: RwLock::new(config),
            stats: StatsRecorder::default(),
            clock,
        }
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.now_nanos()
    }

    /// Access times are only tracked while a size bound is configured.
    pub(crate) fn tracks_access(&self) -> bool {
        self.settings.read().size_bound > 0
    }

    pub(crate) fn eviction_callback(&self) -> Option<EvictionCallback> {
        self.settings.read().eviction_callback.clone()
    }

    fn build_item(&self, value: Value, ttl: Ttl, now: u64) -> Item {
        let settings = self.settings.read();
        let expires_at = settings
            .resolve_ttl(ttl)
            .map(|ttl| now.saturating_add(duration_nanos(ttl)));
        let last_accessed = if settings.size_bound > 0 { now } else { 0 };
        Item {
            value,
            expires_at,
            last_accessed,
        }
    }

    // == Set ==
    /// Stores a value, replacing any existing item for the key.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>, ttl: Ttl) {
        let item = self.build_item(value.into(), ttl, self.now());
        self.items.insert(key.into(), item);
    }

    /// Stores a value using the configured default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.set(key, value, Ttl::Default);
    }

    /// Stores many values sharing one expiration and access instant.
    pub fn set_many<I, K, V>(&self, entries: I, ttl: Ttl)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let now = self.now();
        for (key, value) in entries {
            let item = self.build_item(value.into(), ttl, now);
            self.items.insert(key.into(), item);
        }
    }

    // == Add ==
    /// Stores a value only if no live item exists for the key.
    ///
    /// An expired item counts as absent and is overwritten.
    pub fn add(&self, key: impl Into<String>, value: impl Into<Value>, ttl: Ttl) -> Result<()> {
        let now = self.now();
        let item = self.build_item(value.into(), ttl, now);
        match self.items.entry(key.into()) {
            Entry::Occupied(entry) if !entry.get().is_expired_at(now) => {
                Err(CacheError::AlreadyExists(entry.key().clone()))
            }
            Entry::Occupied(mut entry) => {
                entry.insert(item);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
                Ok(())
            }
        }
    }

    // == Replace ==
    /// Stores a value only if a live item already exists for the key.
    pub fn replace(&self, key: &str, value: impl Into<Value>, ttl: Ttl) -> Result<()> {
        let now = self.now();
        let item = self.build_item(value.into(), ttl, now);
        match self.items.get_mut(key) {
            Some(mut existing) if !existing.is_expired_at(now) => {
                *existing = item;
                Ok(())
            }
            _ => Err(CacheError::NotFound(key.to_string())),
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired items read as absent but stay in the map until swept.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lookup(key).map(|item| item.value)
    }

    /// Retrieves a value together with its expiration, None = never expires.
    pub fn get_with_expiration(&self, key: &str) -> Option<(Value, Option<DateTime<Utc>>)> {
        self.lookup(key).map(|item| {
            let expiration = item.expiration();
            (item.value, expiration)
        })
    }

    fn lookup(&self, key: &str) -> Option<Item> {
        let now = self.now();
        let item = if self.tracks_access() {
            self.items.get_mut(key).and_then(|mut item| {
                if item.is_expired_at(now) {
                    return None;
                }
                item.last_accessed = now;
                Some(item.value().clone())
            })
        } else {
            self.items
                .get(key)
                .filter(|item| !item.is_expired_at(now))
                .map(|item| item.value().clone())
        };
        self.stats.record_lookup(item.is_some());
        item
    }

    // == Delete ==
    /// Removes an item whether or not it has expired.
    ///
    /// The eviction callback, if configured, runs after the removal.
    pub fn delete(&self, key: &str) -> Option<Value> {
        let (key, value) = self.remove_if(key, |_| true)?;
        if let Some(callback) = self.eviction_callback() {
            callback(&key, &value);
        }
        Some(value)
    }

    /// Single removal primitive. `should_remove` runs under the key's shard
    /// lock, so the check and the removal cannot interleave with a writer.
    pub(crate) fn remove_if(
        &self,
        key: &str,
        should_remove: impl FnOnce(&Item) -> bool,
    ) -> Option<Removed> {
        self.items
            .remove_if(key, |_, item| should_remove(item))
            .map(|(key, item)| (key, item.value))
    }

    /// Hands removed pairs to the callback once every removal is applied.
    pub(crate) fn notify_removed(&self, callback: Option<EvictionCallback>, removed: &[Removed]) {
        if let Some(callback) = callback {
            for (key, value) in removed {
                callback(key, value);
            }
        }
    }

    // == Delete Expired ==
    /// Removes all expired items and returns how many were removed.
    pub fn delete_expired(&self) -> usize {
        let now = self.now();
        let callback = self.eviction_callback();

        let expired_keys: Vec<String> = self
            .items
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        let removed: Vec<Removed> = expired_keys
            .iter()
            .filter_map(|key| self.remove_if(key, |item| item.is_expired_at(now)))
            .collect();

        let count = removed.len();
        self.stats.record_expirations(count);
        self.notify_removed(callback, &removed);

        if count > 0 {
            debug!("Expiration sweep removed {} items", count);
        }
        count
    }

    // == Items ==
    /// Copies every live item.
    pub fn items(&self) -> HashMap<String, Item> {
        let now = self.now();
        self.items
            .iter()
            .filter(|entry| !entry.value().is_expired_at(now))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of stored items, including expired ones not yet swept.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    // == Flush ==
    /// Removes every item. No callbacks are invoked.
    pub fn flush(&self) {
        let _settings = self.settings.write();
        self.items.clear();
    }

    // == Configure ==
    /// Updates the live settings.
    ///
    /// Changing `cleanup_interval` here does not start, stop or retime the
    /// janitor; it is read only at construction.
    pub fn configure(&self, update: impl FnOnce(&mut CacheConfig)) {
        let mut settings = self.settings.write();
        update(&mut settings);
    }

    /// Copy of the current settings.
    pub fn config(&self) -> CacheConfig {
        self.settings.read().clone()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.items.len())
    }
}
