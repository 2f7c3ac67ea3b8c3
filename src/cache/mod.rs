//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and approximate LRU eviction.

mod clock;
mod entry;
mod handle;
mod lru;
mod numeric;
mod stats;
mod store;
mod value;


// Re-export public types
pub use clock::{Clock, MockClock, SystemClock};
pub use entry::Item;
pub use handle::Cache;
pub use lru::LruCandidates;
pub use stats::CacheStats;
pub use store::CacheStore;
pub use value::{Direction, Numeric, Value};
