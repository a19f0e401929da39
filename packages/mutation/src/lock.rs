//! Per-path locks that make probe, decide and mutate atomic within a process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

/// Lock table keyed by resolved filesystem path.
///
/// Requests against different paths never contend. An entry lives only as
/// long as some request holds or waits for it.
#[derive(Debug, Default)]
pub struct PathLocks {
    table: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until no other request holds `path`.
    pub fn lock(&self, path: &Path) -> PathGuard<'_> {
        // The shard guard from `entry` must be released before blocking.
        let slot = self.table.entry(path.to_path_buf()).or_default().clone();
        let guard = slot.lock_arc();

        PathGuard {
            locks: self,
            key: path.to_path_buf(),
            guard: Some(guard),
        }
    }

    /// Number of paths currently held or awaited.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Holds one path's lock; releases it and prunes the table on drop.
pub struct PathGuard<'a> {
    locks: &'a PathLocks,
    key: PathBuf,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl PathGuard<'_> {
    pub fn path(&self) -> &Path {
        &self.key
    }
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the table's own reference left: nobody is waiting.
        self.locks
            .table
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl std::fmt::Debug for PathGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathGuard").field("path", &self.key).finish()
    }
}
