//! Janitor Task
//!
//! Background task that periodically removes expired items and, when a size
//! bound is configured, evicts least recently used items.

use std::sync::Weak;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

/// Items removed by one janitor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub evicted: usize,
}

/// Runs one expiration sweep followed, if bounded, by one LRU sweep.
pub fn run_sweep(store: &CacheStore) -> SweepReport {
    let expired = store.delete_expired();
    let evicted = if store.tracks_access() {
        store.delete_lru()
    } else {
        0
    };
    SweepReport { expired, evicted }
}

// == Janitor ==
/// Handle to a running janitor task.
///
/// Dropping the handle stops the task at its next wake-up.
#[derive(Debug)]
pub struct Janitor {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Asks the task to stop. A sweep already in progress runs to completion.
    ///
    /// Returns false if a stop was already requested.
    pub fn stop(&mut self) -> bool {
        match self.stop.take() {
            Some(stop) => {
                let _ = stop.send(());
                true
            }
            None => false,
        }
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns the janitor on the current Tokio runtime.
///
/// The task holds only a weak reference to the store and exits on its own
/// once the store is dropped. The first sweep happens one full `interval`
/// after spawning; ticks missed while a sweep overruns are skipped.
///
/// # Errors
/// Returns `CacheError::NoRuntime` when called outside a Tokio runtime.
///
/// # Panics
/// Panics if `interval` is zero.
pub fn spawn_janitor(store: Weak<CacheStore>, interval: Duration) -> Result<Janitor> {
    let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let handle = runtime.spawn(async move {
        info!("Starting janitor with interval of {:?}", interval);

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                // Resolves on an explicit stop or when the handle is dropped
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    let Some(store) = store.upgrade() else {
                        debug!("Janitor: cache dropped");
                        break;
                    };
                    let report = run_sweep(&store);
                    if report.expired > 0 || report.evicted > 0 {
                        debug!(
                            "Janitor sweep: {} expired, {} evicted",
                            report.expired, report.evicted
                        );
                    }
                }
            }
        }

        info!("Janitor stopped");
    });

    Ok(Janitor {
        stop: Some(stop_tx),
        handle,
    })
}
