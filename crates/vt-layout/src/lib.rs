//! Column layout resolution for the virtualized table viewer
//!
//! Translates mixed-unit width declarations (px, %, rem, em, auto, flex)
//! into absolute pixel widths and offsets across the three pin regions.

pub mod engine;
pub mod units;

// Re-exports
pub use engine::{
    compute_layout, ColumnLayout, ColumnSpec, LayoutEngine, PinnedColumns, Region, ResolvedColumn,
    RowMetrics,
};
pub use units::{SizeValue, UnitContext};
