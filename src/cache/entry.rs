//! Cache Item Module
//!
//! Defines the record stored for each key: value, expiration and last access.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Value;

// == Item ==
/// A single cached value with its expiration and access metadata.
///
/// Instants are nanoseconds since the Unix epoch. `expires_at == None` means
/// the item never expires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// The stored value
    pub value: Value,
    /// Expiration instant, None = never expires
    pub expires_at: Option<u64>,
    /// Last access instant, only maintained while a size bound is configured
    pub last_accessed: u64,
}

impl Item {
    // == Constructors ==
    /// Creates an item that never expires.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
            last_accessed: 0,
        }
    }

    /// Creates an item expiring at the given epoch nanoseconds.
    pub fn expiring_at(value: impl Into<Value>, expires_at: u64) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(expires_at),
            last_accessed: 0,
        }
    }

    // == Is Expired ==
    /// Checks whether the item has expired at `now`.
    ///
    /// An item is expired only once `now` is strictly past its expiration
    /// instant.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    /// Expiration as a UTC timestamp, None if the item never expires.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expires_at.map(nanos_to_utc)
    }

    /// Last access time as a UTC timestamp.
    pub fn last_accessed_at(&self) -> DateTime<Utc> {
        nanos_to_utc(self.last_accessed)
    }
}

/// Converts epoch nanoseconds into a UTC timestamp.
pub(crate) fn nanos_to_utc(nanos: u64) -> DateTime<Utc> {
    Utc.timestamp_nanos(nanos.min(i64::MAX as u64) as i64)
}
