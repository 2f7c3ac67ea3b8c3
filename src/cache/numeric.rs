//! Numeric Mutation Module
//!
//! Increment and decrement of stored numbers. Every variant funnels through
//! one read-modify-write that holds the key's shard lock, so concurrent
//! mutations of the same key do not lose updates.

use crate::cache::store::CacheStore;
use crate::cache::value::{Direction, Numeric};
use crate::cache::Value;
use crate::error::{CacheError, Result};

impl CacheStore {
    /// Applies `mutate` to a live item's value and returns the new value.
    ///
    /// `mutate` returns None when the value's kind rejects the delta, in
    /// which case the item is left untouched.
    fn mutate_numeric<T>(
        &self,
        key: &str,
        mutate: impl FnOnce(&mut Value) -> Option<T>,
    ) -> Result<T> {
        let now = self.now();
        let tracks_access = self.tracks_access();

        let mut item = match self.items.get_mut(key) {
            Some(item) if !item.is_expired_at(now) => item,
            _ => return Err(CacheError::NotFound(key.to_string())),
        };
        let kind = item.value.kind();
        let updated = mutate(&mut item.value).ok_or_else(|| CacheError::WrongType {
            key: key.to_string(),
            kind,
        })?;
        if tracks_access {
            item.last_accessed = now;
        }
        Ok(updated)
    }

    // == Increment ==
    /// Adds an integer delta to any numeric value and returns the result.
    ///
    /// The delta is truncated to the stored width and integers wrap on
    /// overflow. Floats receive the delta converted to their width.
    pub fn increment(&self, key: &str, delta: i64) -> Result<Value> {
        self.offset_int(key, delta, Direction::Increment)
    }

    // == Decrement ==
    /// Subtracts an integer delta from any numeric value.
    pub fn decrement(&self, key: &str, delta: i64) -> Result<Value> {
        self.offset_int(key, delta, Direction::Decrement)
    }

    /// Adds a float delta; only `f32` and `f64` values accept it.
    pub fn increment_float(&self, key: &str, delta: f64) -> Result<Value> {
        self.offset_float(key, delta, Direction::Increment)
    }

    /// Subtracts a float delta; only `f32` and `f64` values accept it.
    pub fn decrement_float(&self, key: &str, delta: f64) -> Result<Value> {
        self.offset_float(key, delta, Direction::Decrement)
    }

    /// Adds a delta of the stored value's exact type and returns the result.
    ///
    /// ```
    /// use mini_cache::{Cache, CacheConfig, Ttl};
    ///
    /// let cache = Cache::new(CacheConfig::default()).unwrap();
    /// cache.set("hits", 250u8, Ttl::Never);
    /// assert_eq!(cache.increment_by("hits", 10u8).unwrap(), 4);
    /// assert!(cache.increment_by("hits", 1i64).is_err());
    /// ```
    pub fn increment_by<T: Numeric>(&self, key: &str, delta: T) -> Result<T> {
        self.offset_typed(key, delta, Direction::Increment)
    }

    /// Subtracts a delta of the stored value's exact type.
    pub fn decrement_by<T: Numeric>(&self, key: &str, delta: T) -> Result<T> {
        self.offset_typed(key, delta, Direction::Decrement)
    }

    fn offset_int(&self, key: &str, delta: i64, direction: Direction) -> Result<Value> {
        self.mutate_numeric(key, |value| {
            value
                .offset_by_int(delta, direction)
                .then(|| value.clone())
        })
    }

    fn offset_float(&self, key: &str, delta: f64, direction: Direction) -> Result<Value> {
        self.mutate_numeric(key, |value| {
            value
                .offset_by_float(delta, direction)
                .then(|| value.clone())
        })
    }

    fn offset_typed<T: Numeric>(&self, key: &str, delta: T, direction: Direction) -> Result<T> {
        self.mutate_numeric(key, |value| {
            let updated = T::from_value(value)?.offset(delta, direction);
            *value = updated.into();
            Some(updated)
        })
    }
}
