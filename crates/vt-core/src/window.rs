//! Contract between the scroll engine and the windowed data model

use std::ops::Range;

/// A windowed row container the scroll engine can drive.
///
/// Implemented by the data layer; the engine only reads the row count,
/// requests fetch windows, and forwards retention hints. All methods are
/// non-blocking: a `set_window` call requests an asynchronous refresh and
/// returns immediately.
pub trait DataWindow: Send + Sync {
    /// Authoritative count of the current filtered result set
    fn total_rows(&self) -> usize;

    /// Demand a contiguous slice `offset..offset + limit`.
    ///
    /// Out-of-range requests are clamped by the implementation; this
    /// never fails.
    fn set_window(&self, offset: usize, limit: usize);

    /// Positions worth keeping; rows outside may be evicted.
    fn retain(&self, range: Range<usize>);
}
