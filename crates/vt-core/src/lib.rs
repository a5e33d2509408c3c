//! Core state machines for the virtualized table viewer
//!
//! This crate provides the framework-agnostic primitives the viewer is
//! built from: the SQL type classifier shared by the data and layout
//! layers, the scroll/fetch engine that maps host scroll input to visible
//! ranges and fetch windows, and the `DataWindow` contract the engine
//! drives. No UI types appear anywhere in this crate.

pub mod config;
pub mod schema;
pub mod scroll;
pub mod snapshot;
pub mod window;

// Re-export commonly used types
pub use config::ScrollConfig;
pub use schema::{cast_for, categorize, is_wide_integer, ColumnSchema, SortKey, TypeCategory};
pub use scroll::{
    compute_visible_range, FetchWindow, ScrollEngine, ScrollFrame, ScrollSubscriber, VisibleRange,
};
pub use snapshot::TableStateSnapshot;
pub use window::DataWindow;
