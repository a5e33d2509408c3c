//! Sparse positional row store

use std::ops::Range;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::values::RowRecord;

/// Positionally indexed store for the currently loaded slice of a result
/// set.
///
/// Positions address rows in the current (filter, sort) ordering; the row
/// mapping and `total_rows` update independently and may disagree for a
/// moment, so consumers treat an absent position as "loading". Merge is
/// last-writer-wins by position.
pub struct SparseRowStore {
    rows: RwLock<AHashMap<usize, Arc<RowRecord>>>,
    total_rows: RwLock<usize>,
}

impl SparseRowStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(AHashMap::new()),
            total_rows: RwLock::new(0),
        }
    }

    /// Row at `position`, or `None` while it is not loaded
    pub fn get_row(&self, position: usize) -> Option<Arc<RowRecord>> {
        self.rows.read().get(&position).cloned()
    }

    pub fn has_row(&self, position: usize) -> bool {
        self.rows.read().contains_key(&position)
    }

    /// Authoritative count of the current filtered result set
    pub fn total_rows(&self) -> usize {
        *self.total_rows.read()
    }

    /// Number of positions currently loaded
    pub fn loaded_rows(&self) -> usize {
        self.rows.read().len()
    }

    /// Replace the count; rows at positions past the new count are
    /// discarded.
    pub fn set_total_rows(&self, total: usize) {
        *self.total_rows.write() = total;
        self.rows.write().retain(|&position, _| position < total);
    }

    /// Insert rows at `offset..offset + rows.len()`, overwriting whatever
    /// was there.
    pub fn merge_rows(&self, offset: usize, rows: Vec<RowRecord>) {
        let mut map = self.rows.write();
        for (i, row) in rows.into_iter().enumerate() {
            map.insert(offset + i, Arc::new(row));
        }
        trace!(offset, loaded = map.len(), "rows merged");
    }

    /// Drop every loaded row
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// Evict rows outside the retention range. Idempotent; the range is
    /// expected to contain the visible range, so on-screen rows survive.
    pub fn evict_outside(&self, retain: Range<usize>) {
        let mut map = self.rows.write();
        let before = map.len();
        map.retain(|&position, _| retain.contains(&position));
        let evicted = before - map.len();
        if evicted > 0 {
            trace!(evicted, retained = map.len(), "evicted rows outside retention");
        }
    }
}

impl Default for SparseRowStore {
    fn default() -> Self {
        Self::new()
    }
}
