//! Frame-driven scroll engine

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::{
    compute_visible_range, plan_fetch_window, render_range, retention_range, FetchWindow,
    ScrollFrame, ScrollSubscriber, VisibleRange,
};
use crate::config::ScrollConfig;
use crate::window::DataWindow;

#[derive(Debug, Clone)]
struct ScrollState {
    scroll_top: f64,
    scroll_left: f64,
    viewport_width: f64,
    viewport_height: f64,
    row_height: f64,
    content_width: f64,
    visible: VisibleRange,
    requested: Option<FetchWindow>,
    last_frame: Option<ScrollFrame>,
    frame_pending: bool,
    detached: bool,
}

/// Maps host scroll input to visible ranges and fetch windows.
///
/// Scroll inputs mutate internal state immediately and mark a frame
/// pending; all derived updates happen in `tick`, which the host calls
/// once per animation frame while `needs_frame` reports true. Successive
/// inputs within one frame coalesce into a single observation, and the
/// fetch window requested for a frame never predates the scroll position
/// its observers saw.
pub struct ScrollEngine {
    data: Arc<dyn DataWindow>,
    config: ScrollConfig,
    state: Mutex<ScrollState>,
    subscribers: RwLock<Vec<Weak<dyn ScrollSubscriber>>>,
}

impl ScrollEngine {
    pub fn new(data: Arc<dyn DataWindow>, config: ScrollConfig) -> Self {
        Self {
            data,
            config,
            state: Mutex::new(ScrollState {
                scroll_top: 0.0,
                scroll_left: 0.0,
                viewport_width: 0.0,
                viewport_height: 0.0,
                row_height: 0.0,
                content_width: 0.0,
                visible: VisibleRange::default(),
                requested: None,
                last_frame: None,
                frame_pending: true,
                detached: false,
            }),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Add a subscriber; dropped subscribers are pruned on notify
    pub fn subscribe(&self, subscriber: Arc<dyn ScrollSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    /// Update viewport dimensions from the host element
    pub fn set_viewport(&self, width: f64, height: f64) {
        let mut state = self.state.lock();
        state.viewport_width = width.max(0.0);
        state.viewport_height = height.max(0.0);
        state.frame_pending = true;
    }

    /// Update measurements from a new layout snapshot
    pub fn set_content_metrics(&self, row_height: f64, content_width: f64) {
        let mut state = self.state.lock();
        state.row_height = row_height.max(0.0);
        state.content_width = content_width.max(0.0);
        state.frame_pending = true;
    }

    /// Host-reported vertical scroll offset
    pub fn set_scroll_top(&self, scroll_top: f64) {
        let total_rows = self.data.total_rows();
        let mut state = self.state.lock();
        state.scroll_top = Self::clamp_top(&state, total_rows, scroll_top);
        state.frame_pending = true;
    }

    /// Relative scroll input (wheel or touch delta)
    pub fn scroll_by(&self, dx: f64, dy: f64) {
        let total_rows = self.data.total_rows();
        let mut state = self.state.lock();
        state.scroll_top = Self::clamp_top(&state, total_rows, state.scroll_top + dy);
        state.scroll_left = Self::clamp_left(&state, state.scroll_left + dx);
        state.frame_pending = true;
    }

    /// Scroll so that row `index` is at the top of the viewport
    pub fn scroll_to_row(&self, index: usize) {
        let total_rows = self.data.total_rows();
        let mut state = self.state.lock();
        let target = index as f64 * state.row_height;
        state.scroll_top = Self::clamp_top(&state, total_rows, target);
        state.frame_pending = true;
    }

    pub fn scroll_to_top(&self) {
        let mut state = self.state.lock();
        state.scroll_top = 0.0;
        state.frame_pending = true;
    }

    /// Clamp and set the horizontal scroll offset
    pub fn scroll_to_x(&self, scroll_left: f64) {
        let mut state = self.state.lock();
        state.scroll_left = Self::clamp_left(&state, scroll_left);
        state.frame_pending = true;
    }

    pub fn scroll_top(&self) -> f64 {
        self.state.lock().scroll_top
    }

    pub fn scroll_left(&self) -> f64 {
        self.state.lock().scroll_left
    }

    pub fn visible_range(&self) -> VisibleRange {
        self.state.lock().visible
    }

    /// Whether a tick is due
    pub fn needs_frame(&self) -> bool {
        let state = self.state.lock();
        state.frame_pending && !state.detached
    }

    /// Cancel any pending frame and stop driving the data model
    pub fn detach(&self) {
        let mut state = self.state.lock();
        state.detached = true;
        state.frame_pending = false;
    }

    /// Run one frame: recompute the visible range, publish it, then update
    /// the fetch window and retention hints on the data model.
    pub fn tick(&self) {
        let total_rows = self.data.total_rows();

        let (frame, changed, fetch, retain) = {
            let mut state = self.state.lock();
            if state.detached || !state.frame_pending {
                return;
            }
            // Re-clamp: the row count may have changed since the input arrived.
            state.scroll_top = Self::clamp_against(
                state.scroll_top,
                total_rows as f64 * state.row_height - state.viewport_height,
            );

            let visible = compute_visible_range(
                state.scroll_top,
                state.viewport_height,
                state.row_height,
                total_rows,
            );
            state.visible = visible;

            let render = render_range(&visible, self.config.overscan, total_rows);
            let viewport_rows = if state.row_height > 0.0 {
                (state.viewport_height / state.row_height).ceil() as usize
            } else {
                0
            };
            let fetch = plan_fetch_window(
                &render,
                viewport_rows,
                total_rows,
                &self.config,
                state.requested,
            );
            if let Some(window) = fetch {
                state.requested = Some(window);
            }
            let retain = state.requested.map(|window| {
                retention_range(&visible, window.limit, self.config.retention_factor, total_rows)
            });

            state.frame_pending = false;
            let frame = ScrollFrame {
                visible,
                scroll_top: state.scroll_top,
                scroll_left: state.scroll_left,
            };
            let changed = state.last_frame != Some(frame);
            state.last_frame = Some(frame);
            (frame, changed, fetch, retain)
        };

        // Observers first: a set_window call is never issued before they
        // have seen the range it was derived from.
        if changed {
            self.notify(&frame);
        }
        if let Some(window) = fetch {
            debug!(
                offset = window.offset,
                limit = window.limit,
                "fetch window changed"
            );
            self.data.set_window(window.offset, window.limit);
        }
        if let Some(range) = retain {
            self.data.retain(range);
        }
    }

    fn notify(&self, frame: &ScrollFrame) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);
        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_scroll_frame(frame);
            }
        }
    }

    fn clamp_top(state: &ScrollState, total_rows: usize, value: f64) -> f64 {
        let extent = total_rows as f64 * state.row_height - state.viewport_height;
        Self::clamp_against(value, extent)
    }

    fn clamp_left(state: &ScrollState, value: f64) -> f64 {
        Self::clamp_against(value, state.content_width - state.viewport_width)
    }

    fn clamp_against(value: f64, max: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        value.clamp(0.0, max.max(0.0))
    }
}
