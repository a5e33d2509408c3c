//! Table binding: the data handle a viewer consumes
//!
//! Created once per table; fetches the schema, wires the sparse store to
//! the row-window and count clients, and implements the `DataWindow`
//! contract the scroll engine drives.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use vt_core::schema::{ColumnSchema, SortKey};
use vt_core::window::DataWindow;

use crate::client::{Coordinator, CountClient, QueryClient, RowWindowClient};
use crate::model::SparseRowStore;
use crate::values::RowRecord;
use crate::DataError;

pub struct TableBinding {
    table: String,
    schema: Vec<ColumnSchema>,
    store: Arc<SparseRowStore>,
    rows: Arc<RowWindowClient>,
    count: Arc<CountClient>,
    coordinator: Arc<Coordinator>,
    error: Arc<RwLock<Option<DataError>>>,
}

impl TableBinding {
    /// Fetch the table's schema and register both clients with the
    /// coordinator. A failed or empty schema fetch is fatal: no binding
    /// is returned and nothing is registered.
    pub async fn connect(coordinator: Arc<Coordinator>, table: &str) -> Result<Arc<Self>, DataError> {
        let fields = coordinator
            .field_info(table)
            .await
            .map_err(|e| DataError::SchemaFetch(e.to_string()))?;
        if fields.is_empty() {
            return Err(DataError::SchemaFetch(format!(
                "table '{table}' has no columns"
            )));
        }
        let schema: Vec<ColumnSchema> = fields
            .iter()
            .map(|field| ColumnSchema::new(&field.column, &field.sql_type))
            .collect();
        info!(table, columns = schema.len(), "table binding connected");

        let store = Arc::new(SparseRowStore::new());
        let error = Arc::new(RwLock::new(None));
        let rows = RowWindowClient::new(
            table,
            schema.clone(),
            store.clone(),
            coordinator.clone(),
            error.clone(),
        );
        let count = CountClient::new(table, store.clone(), coordinator.clone(), error.clone());

        coordinator.connect(rows.clone() as Arc<dyn QueryClient>);
        coordinator.connect(count.clone() as Arc<dyn QueryClient>);

        let binding = Arc::new(Self {
            table: table.to_string(),
            schema,
            store,
            rows,
            count,
            coordinator,
            error,
        });
        // Kick off the initial count and first row window.
        binding.count.on_filter_change();
        binding.rows.request_refresh();
        Ok(binding)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn get_row(&self, position: usize) -> Option<Arc<RowRecord>> {
        self.store.get_row(position)
    }

    pub fn has_row(&self, position: usize) -> bool {
        self.store.has_row(position)
    }

    pub fn total_rows(&self) -> usize {
        self.store.total_rows()
    }

    /// Whether a row query is outstanding or queued
    pub fn is_loading(&self) -> bool {
        self.rows.is_loading()
    }

    pub fn sort(&self) -> Vec<SortKey> {
        self.rows.sort()
    }

    pub fn set_sort(&self, sort: Vec<SortKey>) {
        self.rows.set_sort(sort);
    }

    /// Most recent query error, if any
    pub fn last_error(&self) -> Option<String> {
        self.error.read().as_ref().map(|e| e.to_string())
    }

    /// Await a full re-execution of both clients. Deterministic
    /// alternative to the fire-and-forget refreshes used on scroll.
    pub async fn refresh(&self) {
        let count = self.count.clone() as Arc<dyn QueryClient>;
        let rows = self.rows.clone() as Arc<dyn QueryClient>;
        self.coordinator.refresh(&count).await;
        self.coordinator.refresh(&rows).await;
    }

    /// Detach both clients from the coordinator
    pub fn disconnect(&self) {
        let rows = self.rows.clone() as Arc<dyn QueryClient>;
        let count = self.count.clone() as Arc<dyn QueryClient>;
        self.coordinator.disconnect(&rows);
        self.coordinator.disconnect(&count);
    }
}

impl DataWindow for TableBinding {
    fn total_rows(&self) -> usize {
        self.store.total_rows()
    }

    fn set_window(&self, offset: usize, limit: usize) {
        self.rows.fetch_window(offset, limit);
    }

    fn retain(&self, range: Range<usize>) {
        self.store.evict_outside(range);
    }
}
