//! Snapshot Persistence
//!
//! Best-effort export and import of live items as a versioned JSON document.
//!
//! Snapshot format:
//! - `version`: format version, currently 1
//! - `taken_at`: epoch nanoseconds when the snapshot was taken
//! - `items`: map of key to item (value, expiration, last access)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheStore, Item};
use crate::error::{CacheError, Result};

const SNAPSHOT_VERSION: u32 = 1;

/// On-disk snapshot document.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    taken_at: u64,
    items: HashMap<String, Item>,
}

impl CacheStore {
    // == Export ==
    /// Writes every live item to `writer`.
    ///
    /// The item set is copied before encoding starts, so an encoding failure
    /// leaves the cache untouched.
    pub fn export_to<W: Write>(&self, writer: W) -> Result<()> {
        let snapshot = SnapshotFile {
            version: SNAPSHOT_VERSION,
            taken_at: self.now(),
            items: self.items(),
        };
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;
        debug!("Exported snapshot with {} items", snapshot.items.len());
        Ok(())
    }

    /// Returns every live item as a snapshot blob.
    pub fn export(&self) -> Result<Vec<u8>> {
        let mut blob = Vec::new();
        self.export_to(&mut blob)?;
        Ok(blob)
    }

    // == Import ==
    /// Merges a snapshot read from `reader` into the cache.
    ///
    /// Keys that currently hold a live item are left alone; absent or
    /// expired keys take the snapshot's item. The whole document is decoded
    /// before any key is written, so malformed input changes nothing.
    /// Returns the number of items written.
    pub fn import_from<R: Read>(&self, reader: R) -> Result<usize> {
        let snapshot: SnapshotFile = serde_json::from_reader(BufReader::new(reader))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CacheError::UnsupportedSnapshotVersion(snapshot.version));
        }

        let now = self.now();
        let total = snapshot.items.len();
        let mut written = 0;
        for (key, item) in snapshot.items {
            match self.items.entry(key) {
                Entry::Occupied(entry) if !entry.get().is_expired_at(now) => {}
                Entry::Occupied(mut entry) => {
                    entry.insert(item);
                    written += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(item);
                    written += 1;
                }
            }
        }
        let skipped = total - written;
        if skipped > 0 {
            warn!("Snapshot import skipped {} keys holding live items", skipped);
        }
        debug!("Imported snapshot: {} of {} items written", written, total);
        Ok(written)
    }

    /// Merges a snapshot blob produced by [`export`](Self::export).
    pub fn import(&self, blob: &[u8]) -> Result<usize> {
        self.import_from(blob)
    }

    // == Files ==
    /// Writes a snapshot to `path`, creating or truncating the file.
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.export_to(file)
    }

    /// Merges the snapshot stored at `path`.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let file = File::open(path)?;
        self.import_from(file)
    }
}
