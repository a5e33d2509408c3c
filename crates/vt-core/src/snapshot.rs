//! Externally persisted table state
//!
//! The core persists nothing itself; hosts may serialize this snapshot
//! and feed it back when rebuilding a table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schema::SortKey;

/// Pure snapshot of user-adjustable table state. No behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableStateSnapshot {
    /// Explicit pixel widths by column key
    pub column_widths: HashMap<String, f64>,
    /// Display order of column keys
    pub column_order: Vec<String>,
    /// Keys pinned to the left region, in order
    pub pinned_left: Vec<String>,
    /// Keys pinned to the right region, in order
    pub pinned_right: Vec<String>,
    /// Current sort order
    pub sort: Vec<SortKey>,
    /// Preferred fetch page size
    pub page_size: usize,
}
