//! Total count client

use std::sync::{Arc, Weak};

use arrow::record_batch::RecordBatch;
use parking_lot::RwLock;
use tracing::{debug, warn};

use super::{raw_cell, Coordinator, QueryClient};
use crate::model::SparseRowStore;
use crate::sql::{count_star, Expr, Query};
use crate::values::RawCell;
use crate::DataError;

/// Fetches the total row count of the filtered result set and forwards
/// it to the store. Re-executes whenever the shared filter changes; the
/// count and the row windows may disagree for a moment and the store
/// tolerates that.
pub struct CountClient {
    table: String,
    store: Arc<SparseRowStore>,
    coordinator: Arc<Coordinator>,
    error_sink: Arc<RwLock<Option<DataError>>>,
    me: Weak<CountClient>,
}

impl CountClient {
    pub fn new(
        table: impl Into<String>,
        store: Arc<SparseRowStore>,
        coordinator: Arc<Coordinator>,
        error_sink: Arc<RwLock<Option<DataError>>>,
    ) -> Arc<Self> {
        let table = table.into();
        Arc::new_cyclic(|me| Self {
            table,
            store,
            coordinator,
            error_sink,
            me: me.clone(),
        })
    }
}

impl QueryClient for CountClient {
    fn build_query(&self, filter: Option<&Expr>) -> Option<Query> {
        Some(
            Query::from(&self.table)
                .select(vec![count_star().alias("count")])
                .filter(filter.cloned()),
        )
    }

    fn on_result(&self, batch: RecordBatch) {
        let Some(column) = batch.column_by_name("count") else {
            warn!(table = %self.table, "count result missing count column");
            return;
        };
        if batch.num_rows() == 0 {
            return;
        }
        let total = match raw_cell(column, 0) {
            RawCell::Int(n) => n.max(0) as usize,
            RawCell::Text(s) => s.parse().unwrap_or(0),
            _ => 0,
        };
        debug!(table = %self.table, total, "count delivered");
        self.store.set_total_rows(total);
    }

    fn on_error(&self, error: DataError) {
        warn!(%error, table = %self.table, "count query failed");
        *self.error_sink.write() = Some(error);
    }

    fn on_filter_change(&self) {
        if let Some(me) = self.me.upgrade() {
            self.coordinator.request_update(me);
        }
    }
}
