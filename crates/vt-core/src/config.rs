//! Engine tuning knobs

use serde::{Deserialize, Serialize};

/// Configuration for the scroll/fetch scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Rows laid out beyond each edge of the visible range
    pub overscan: usize,
    /// Fetch band size multiplier applied to the render range
    pub pad_factor: usize,
    /// Retention radius as a multiple of the current fetch limit
    pub retention_factor: usize,
    /// Round fetch offsets down to a multiple of the viewport row count
    pub page_align: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            overscan: 6,
            pad_factor: 3,
            retention_factor: 2,
            page_align: true,
        }
    }
}
