//! Shared reactive filter selection

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

use crate::sql::Expr;

/// Trait for parties that re-execute work when the filter changes
pub trait FilterSubscriber: Send + Sync {
    fn on_filter_change(&self);
}

/// A filter predicate shared between query clients.
///
/// Clients never observe the filter directly; the coordinator subscribes
/// and re-runs every connected client when the selection mutates. The
/// version counter lets late observers detect that they queried against
/// an older selection.
pub struct FilterHandle {
    predicate: RwLock<Option<Expr>>,
    version: RwLock<u64>,
    subscribers: RwLock<Vec<Weak<dyn FilterSubscriber>>>,
}

impl FilterHandle {
    pub fn new() -> Self {
        Self {
            predicate: RwLock::new(None),
            version: RwLock::new(0),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Current predicate, if any
    pub fn get(&self) -> Option<Expr> {
        self.predicate.read().clone()
    }

    pub fn version(&self) -> u64 {
        *self.version.read()
    }

    /// Replace the predicate and notify subscribers
    pub fn set(&self, predicate: Option<Expr>) {
        {
            let mut current = self.predicate.write();
            *current = predicate;
            *self.version.write() += 1;
        }
        debug!(version = self.version(), "filter selection changed");
        self.notify();
    }

    pub fn subscribe(&self, subscriber: Arc<dyn FilterSubscriber>) {
        self.subscribers.write().push(Arc::downgrade(&subscriber));
    }

    fn notify(&self) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);
        for weak in subscribers.iter() {
            if let Some(subscriber) = weak.upgrade() {
                subscriber.on_filter_change();
            }
        }
    }
}

impl Default for FilterHandle {
    fn default() -> Self {
        Self::new()
    }
}
