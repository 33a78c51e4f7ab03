//! Process-wide cache of load outcomes.
//!
//! Maps a resource identifier to the last status observed for it, so a
//! consumer mounted after a load finished gets the answer synchronously.
//! Entries are written when a handle completes and removed only by an explicit
//! eviction (`remove_on_unmount`).

use crate::resources::loadstatus::LoadStatus;
use rustc_hash::FxHashMap;

/// Identifier -> last known status.
#[derive(Debug, Clone, Default)]
pub struct StatusCache {
    statuses: FxHashMap<String, LoadStatus>,
}

impl StatusCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached status for `identifier`, if any.
    pub fn get(&self, identifier: &str) -> Option<LoadStatus> {
        self.statuses.get(identifier).copied()
    }

    /// Cached status for `identifier` only when it is terminal.
    pub fn terminal(&self, identifier: &str) -> Option<LoadStatus> {
        self.get(identifier).filter(|s| s.is_terminal())
    }

    /// Record `status` for `identifier`, replacing any previous entry.
    pub fn set(&mut self, identifier: impl Into<String>, status: LoadStatus) {
        self.statuses.insert(identifier.into(), status);
    }

    /// Evict the entry for `identifier`. Returns the removed status.
    pub fn delete(&mut self, identifier: &str) -> Option<LoadStatus> {
        self.statuses.remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Read-only view of every entry.
    pub fn entries(&self) -> &FxHashMap<String, LoadStatus> {
        &self.statuses
    }
}
