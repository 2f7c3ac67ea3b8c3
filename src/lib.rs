//! Mini Cache - A concurrent in-process key-value cache
//!
//! Provides per-item TTL expiration, a soft size bound enforced by
//! approximate LRU eviction, and a background janitor performing both.

pub mod cache;
pub mod config;
pub mod error;
mod snapshot;
pub mod tasks;

pub use cache::{Cache, CacheStats, CacheStore, Item, Value};
pub use config::{CacheConfig, EvictionCallback, Ttl};
pub use error::{CacheError, Result};
