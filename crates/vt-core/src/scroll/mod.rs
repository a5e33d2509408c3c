//! Scroll virtualization: range math, fetch planning, and the frame-driven
//! engine that ties them to a windowed data model

mod engine;
mod subscriber;

pub use engine::ScrollEngine;
pub use subscriber::{ScrollFrame, ScrollSubscriber};

use std::ops::Range;

use crate::config::ScrollConfig;

/// Half-open interval of row positions intersecting the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// The contiguous slice the row client currently demands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub offset: usize,
    pub limit: usize,
}

impl FetchWindow {
    pub fn end(&self) -> usize {
        self.offset + self.limit
    }

    /// Whether the window fully covers `range`
    pub fn contains(&self, range: &VisibleRange) -> bool {
        range.start >= self.offset && range.end <= self.end()
    }
}

/// Map a scroll offset to the rows intersecting the viewport.
///
/// Always returns `0 <= start <= end <= total_rows`; degenerate inputs
/// (non-positive row height, NaN) collapse to an empty range at zero.
pub fn compute_visible_range(
    scroll_top: f64,
    viewport_height: f64,
    row_height: f64,
    total_rows: usize,
) -> VisibleRange {
    if !(row_height > 0.0) || total_rows == 0 {
        return VisibleRange::default();
    }
    let scroll_top = scroll_top.max(0.0);
    let viewport_height = viewport_height.max(0.0);

    let start = ((scroll_top / row_height).floor() as usize).min(total_rows);
    let end = (((scroll_top + viewport_height) / row_height).ceil() as usize).min(total_rows);
    VisibleRange {
        start: start.min(end),
        end,
    }
}

/// Expand a visible range by the overscan, clamped to `[0, total_rows]`
pub fn render_range(visible: &VisibleRange, overscan: usize, total_rows: usize) -> VisibleRange {
    VisibleRange {
        start: visible.start.saturating_sub(overscan),
        end: (visible.end + overscan).min(total_rows),
    }
}

/// Decide whether a new fetch window is needed and, if so, plan it.
///
/// A window is requested iff none has been requested yet or the render
/// range is no longer contained in the current one. The new window centers
/// a padded band on the render range midpoint, clamps to the data set, and
/// rounds the offset down to a page boundary to reduce churn.
pub fn plan_fetch_window(
    render: &VisibleRange,
    viewport_rows: usize,
    total_rows: usize,
    config: &ScrollConfig,
    current: Option<FetchWindow>,
) -> Option<FetchWindow> {
    if total_rows == 0 {
        return None;
    }
    if let Some(window) = current {
        if window.contains(render) {
            return None;
        }
    }

    let band = render
        .len()
        .max(3 * viewport_rows)
        .max(1)
        .saturating_mul(config.pad_factor.max(1));
    let band = band.min(total_rows);

    let midpoint = (render.start + render.end) / 2;
    let mut offset = midpoint
        .saturating_sub(band / 2)
        .min(total_rows - band);
    if config.page_align {
        let page = viewport_rows.max(1);
        offset -= offset % page;
    }
    let limit = band.min(total_rows - offset);

    Some(FetchWindow {
        offset,
        limit: limit.max(1),
    })
}

/// Positions to keep in the data model around the visible range
pub fn retention_range(
    visible: &VisibleRange,
    fetch_limit: usize,
    retention_factor: usize,
    total_rows: usize,
) -> Range<usize> {
    let radius = fetch_limit.saturating_mul(retention_factor.max(1));
    let start = visible.start.saturating_sub(radius);
    let end = (visible.end + radius).min(total_rows);
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_range_basic() {
        let range = compute_visible_range(250.0, 400.0, 50.0, 1000);
        assert_eq!(range, VisibleRange { start: 5, end: 13 });
    }

    #[test]
    fn visible_range_is_ordered_and_clamped() {
        for &(top, vh, rh, total) in &[
            (0.0, 400.0, 50.0, 1000usize),
            (49_950.0, 400.0, 50.0, 1000),
            (1e9, 400.0, 50.0, 1000),
            (0.0, 0.0, 50.0, 1000),
            (123.0, 400.0, 50.0, 0),
            (-10.0, 400.0, 50.0, 7),
        ] {
            let r = compute_visible_range(top, vh, rh, total);
            assert!(r.start <= r.end, "start <= end for {top} {vh} {rh} {total}");
            assert!(r.end <= total);
        }
    }

    #[test]
    fn visible_range_degenerate_row_height() {
        assert_eq!(
            compute_visible_range(100.0, 400.0, 0.0, 1000),
            VisibleRange::default()
        );
        assert_eq!(
            compute_visible_range(100.0, 400.0, f64::NAN, 1000),
            VisibleRange::default()
        );
    }

    #[test]
    fn visible_range_round_trips_row_offsets() {
        let (vh, rh, total): (f64, f64, usize) = (400.0, 50.0, 1000usize);
        let viewport_rows = (vh / rh).ceil() as usize;
        for i in [0usize, 1, 17, 500, total - viewport_rows] {
            let r = compute_visible_range(i as f64 * rh, vh, rh, total);
            assert_eq!(r.start, i, "row {i} maps back to itself");
        }
    }

    #[test]
    fn render_range_clamps_to_bounds() {
        let visible = VisibleRange { start: 2, end: 10 };
        let r = render_range(&visible, 5, 12);
        assert_eq!(r, VisibleRange { start: 0, end: 12 });
    }

    #[test]
    fn fetch_window_kept_while_contained() {
        let config = ScrollConfig::default();
        let render = VisibleRange { start: 10, end: 40 };
        let current = Some(FetchWindow {
            offset: 0,
            limit: 60,
        });
        assert_eq!(plan_fetch_window(&render, 20, 1000, &config, current), None);
    }

    #[test]
    fn fetch_window_replaced_on_jump() {
        // Viewport of 20 rows, overscan 5, jump to row 500.
        let config = ScrollConfig::default();
        let visible = VisibleRange {
            start: 500,
            end: 520,
        };
        let render = render_range(&visible, 5, 1000);
        let current = Some(FetchWindow {
            offset: 0,
            limit: 60,
        });
        let window = plan_fetch_window(&render, 20, 1000, &config, current).unwrap();
        assert!(window.contains(&render), "window covers the render range");
        assert_eq!(window.offset % 20, 0, "offset is page aligned");
        assert_eq!(window.limit, 180);
    }

    #[test]
    fn fetch_window_clamps_near_the_end() {
        let config = ScrollConfig::default();
        let visible = VisibleRange {
            start: 990,
            end: 1000,
        };
        let render = render_range(&visible, 5, 1000);
        let window = plan_fetch_window(&render, 10, 1000, &config, None).unwrap();
        assert!(window.end() <= 1000);
        assert!(window.contains(&render));
    }

    #[test]
    fn fetch_window_small_dataset() {
        let config = ScrollConfig::default();
        let render = VisibleRange { start: 0, end: 8 };
        let window = plan_fetch_window(&render, 20, 8, &config, None).unwrap();
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, 8);
    }

    #[test]
    fn no_fetch_for_empty_dataset() {
        let config = ScrollConfig::default();
        let render = VisibleRange::default();
        assert_eq!(plan_fetch_window(&render, 20, 0, &config, None), None);
    }

    #[test]
    fn retention_range_straddles_visible() {
        let visible = VisibleRange {
            start: 480,
            end: 520,
        };
        let range = retention_range(&visible, 180, 2, 1000);
        assert_eq!(range, 120..880);
        // Never shrinks below the visible range itself.
        assert!(range.start <= visible.start && range.end >= visible.end);
    }
}
