//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a cache.
//!
//! # Tasks
//! - Janitor: removes expired items and restores the soft size bound

mod janitor;

pub use janitor::{run_sweep, spawn_janitor, Janitor, SweepReport};
