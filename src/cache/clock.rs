//! Clock Module
//!
//! Time source abstraction so expiration and access stamps can be driven
//! deterministically in tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Clock Trait ==
/// Source of wall-clock time for the cache.
///
/// All instants stored in items are nanoseconds since the Unix epoch, so a
/// snapshot taken in one process can be restored in another.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time as nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> u64;
}

// == System Clock ==
/// Real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        duration_nanos(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
        )
    }
}

/// Whole nanoseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

// == Mock Clock ==
/// Manually advanced clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// hand another to the cache.
///
/// ```
/// use std::time::Duration;
/// use mini_cache::cache::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// let start = clock.now_nanos();
/// clock.advance(Duration::from_secs(5));
/// assert_eq!(clock.now_nanos() - start, 5_000_000_000);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    nanos: Arc<AtomicU64>,
}

impl MockClock {
    /// Creates a mock clock starting at the current real time.
    pub fn new() -> Self {
        Self::at(SystemClock.now_nanos())
    }

    /// Creates a mock clock starting at the given epoch nanoseconds.
    pub fn at(nanos: u64) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(nanos)),
        }
    }

    /// Moves the clock forward, saturating at the largest representable instant.
    pub fn advance(&self, duration: Duration) {
        let step = duration_nanos(duration);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |nanos| {
                Some(nanos.saturating_add(step))
            });
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_nanos(&self) -> u64 {
        self.nanos.load(Ordering::SeqCst)
    }
}
