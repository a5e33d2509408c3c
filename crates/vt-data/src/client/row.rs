//! Row window client

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arrow::record_batch::RecordBatch;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use vt_core::schema::{cast_for, ColumnSchema, SortKey};

use super::{raw_cell, Coordinator, QueryClient};
use crate::model::SparseRowStore;
use crate::sql::{column, row_number_over, Expr, Query};
use crate::values::{parse_value, RowRecord, Value};
use crate::DataError;

/// Reserved projection carrying the backend-assigned position
pub const OID_COLUMN: &str = "__oid";

/// Fetch limit used before the scheduler requests its first window
const INITIAL_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy)]
struct IssuedQuery {
    generation: u64,
    offset: usize,
    limit: usize,
}

#[derive(Debug)]
struct RowState {
    sort: Vec<SortKey>,
    offset: usize,
    limit: usize,
    in_flight: bool,
    pending: bool,
    issued: Option<IssuedQuery>,
}

/// Fetches the demanded window of rows with stable ordering.
///
/// Projects every column (with the transport casts the schema calls for)
/// plus `__oid = row_number()` over the current sort, parses delivered
/// cells, and merges them into the store at the window offset. At most
/// one query is in flight; a window change while one is outstanding is
/// replayed when it completes. Sort changes bump a generation stamp and
/// clear the store, so deliveries from an older ordering are dropped
/// instead of surfacing remapped positions.
pub struct RowWindowClient {
    table: String,
    schema: Vec<ColumnSchema>,
    store: Arc<SparseRowStore>,
    coordinator: Arc<Coordinator>,
    generation: AtomicU64,
    state: Mutex<RowState>,
    error_sink: Arc<RwLock<Option<DataError>>>,
    me: Weak<RowWindowClient>,
}

impl RowWindowClient {
    pub fn new(
        table: impl Into<String>,
        schema: Vec<ColumnSchema>,
        store: Arc<SparseRowStore>,
        coordinator: Arc<Coordinator>,
        error_sink: Arc<RwLock<Option<DataError>>>,
    ) -> Arc<Self> {
        let table = table.into();
        Arc::new_cyclic(|me| Self {
            table,
            schema,
            store,
            coordinator,
            generation: AtomicU64::new(0),
            state: Mutex::new(RowState {
                sort: Vec::new(),
                offset: 0,
                limit: INITIAL_LIMIT,
                in_flight: false,
                pending: false,
                issued: None,
            }),
            error_sink,
            me: me.clone(),
        })
    }

    pub fn sort(&self) -> Vec<SortKey> {
        self.state.lock().sort.clone()
    }

    /// Current demanded window as `(offset, limit)`
    pub fn window(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.offset, state.limit)
    }

    /// Whether a query is outstanding or queued
    pub fn is_loading(&self) -> bool {
        let state = self.state.lock();
        state.in_flight || state.pending
    }

    /// Demand the slice `offset..offset + limit`.
    ///
    /// Out-of-range input clamps to the valid range and never fails. A
    /// no-op when the window is unchanged.
    pub fn fetch_window(&self, offset: usize, limit: usize) {
        let limit = limit.max(1);
        let total = self.store.total_rows();
        let offset = if total > 0 { offset.min(total - 1) } else { 0 };

        {
            let mut state = self.state.lock();
            if state.offset == offset && state.limit == limit {
                return;
            }
            state.offset = offset;
            state.limit = limit;
        }
        self.schedule();
    }

    /// Replace the sort order.
    ///
    /// Positions remap under a new ordering, so the store is cleared and
    /// the window rewinds to the top before the re-execution is
    /// requested; deliveries stamped with the old generation are dropped.
    pub fn set_sort(&self, sort: Vec<SortKey>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.clear();
        {
            let mut state = self.state.lock();
            state.sort = sort;
            state.offset = 0;
        }
        debug!(generation = self.generation.load(Ordering::SeqCst), "sort changed");
        self.schedule();
    }

    /// Request a (re-)execution, keeping at most one query in flight
    pub fn request_refresh(&self) {
        self.schedule();
    }

    fn schedule(&self) {
        {
            let mut state = self.state.lock();
            if state.in_flight {
                state.pending = true;
                return;
            }
            state.in_flight = true;
        }
        if let Some(me) = self.me.upgrade() {
            self.coordinator.request_update(me);
        }
    }

    /// Complete a delivery and replay any superseding request
    fn finish_delivery(&self) {
        let reissue = {
            let mut state = self.state.lock();
            state.in_flight = false;
            if state.pending {
                state.pending = false;
                state.in_flight = true;
                true
            } else {
                false
            }
        };
        if reissue {
            if let Some(me) = self.me.upgrade() {
                self.coordinator.request_update(me);
            }
        }
    }

    fn parse_batch(&self, batch: &RecordBatch) -> Vec<RowRecord> {
        let oid_column = batch.column_by_name(OID_COLUMN);
        let mut records = Vec::with_capacity(batch.num_rows());

        for row in 0..batch.num_rows() {
            let oid = oid_column
                .map(|col| match raw_cell(col, row) {
                    crate::values::RawCell::Int(i) => i,
                    crate::values::RawCell::Text(s) => s.parse().unwrap_or(0),
                    _ => 0,
                })
                .unwrap_or(0);

            let mut values = ahash::AHashMap::with_capacity(self.schema.len());
            for schema in &self.schema {
                let value = match batch.column_by_name(&schema.key) {
                    Some(col) => parse_value(raw_cell(col, row), schema),
                    None => Value::Null,
                };
                values.insert(schema.key.clone(), value);
            }
            records.push(RowRecord { oid, values });
        }
        records
    }
}

impl QueryClient for RowWindowClient {
    fn build_query(&self, filter: Option<&Expr>) -> Option<Query> {
        let mut state = self.state.lock();
        let issued = IssuedQuery {
            generation: self.generation.load(Ordering::SeqCst),
            offset: state.offset,
            limit: state.limit,
        };
        state.issued = Some(issued);

        let mut projections: Vec<Expr> = self
            .schema
            .iter()
            .map(|schema| match cast_for(schema) {
                Some(ty) => crate::sql::cast(column(&schema.key), ty).alias(&schema.key),
                None => column(&schema.key),
            })
            .collect();
        projections.push(row_number_over(state.sort.clone()).alias(OID_COLUMN));

        Some(
            Query::from(&self.table)
                .select(projections)
                .filter(filter.cloned())
                .order_by(state.sort.clone())
                .limit(issued.limit)
                .offset(issued.offset),
        )
    }

    fn on_result(&self, batch: RecordBatch) {
        let (issued, current_window) = {
            let mut state = self.state.lock();
            (state.issued.take(), (state.offset, state.limit))
        };
        let Some(issued) = issued else {
            self.finish_delivery();
            return;
        };

        let generation = self.generation.load(Ordering::SeqCst);
        if issued.generation != generation {
            debug!(
                stale = issued.generation,
                current = generation,
                "dropping result from superseded ordering"
            );
            self.finish_delivery();
            return;
        }

        // Drop deliveries that no longer intersect the demanded window;
        // a later scroll position must never resurrect an older slice.
        let (offset, limit) = current_window;
        if issued.offset >= offset + limit || offset >= issued.offset + issued.limit {
            debug!(issued = issued.offset, offset, "dropping result outside current window");
            self.finish_delivery();
            return;
        }

        let records = self.parse_batch(&batch);
        debug!(offset = issued.offset, rows = records.len(), "row window delivered");
        self.store.merge_rows(issued.offset, records);
        self.finish_delivery();
    }

    fn on_error(&self, error: DataError) {
        warn!(%error, table = %self.table, "row query failed");
        *self.error_sink.write() = Some(error);
        self.finish_delivery();
    }

    fn on_filter_change(&self) {
        // Positions remap under a new predicate exactly as under a new
        // sort: invalidate, rewind, re-execute.
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.clear();
        self.state.lock().offset = 0;
        self.schedule();
    }
}
