//! Coordinator/client query protocol
//!
//! Long-lived clients register with a coordinator that owns the shared
//! filter selection and an execution backend. The coordinator invokes
//! each client's query generator on demand and delivers tabular results
//! back to it; a filter mutation re-invokes every connected client.

mod count;
mod row;
pub mod sqlite;

pub use count::CountClient;
pub use row::RowWindowClient;

use std::sync::{Arc, Weak};

use arrow::array::{Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::warn;

use crate::filter::{FilterHandle, FilterSubscriber};
use crate::sql::{Expr, Query};
use crate::values::RawCell;
use crate::DataError;

/// Column metadata reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub column: String,
    pub sql_type: String,
}

/// Query execution seam to the analytic engine.
///
/// Submission is asynchronous; the coordinator awaits the result and
/// delivers it to the requesting client.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn execute(&self, sql: &str) -> anyhow::Result<RecordBatch>;

    /// Column names and SQL types for a table
    async fn field_info(&self, table: &str) -> anyhow::Result<Vec<FieldInfo>>;
}

/// A long-lived query participant
pub trait QueryClient: Send + Sync {
    /// Produce the client's current query, or `None` when it has nothing
    /// to ask
    fn build_query(&self, filter: Option<&Expr>) -> Option<Query>;

    /// Result delivery; always paired with the most recent `build_query`
    fn on_result(&self, batch: RecordBatch);

    /// Bounded error delivery; the client's state must survive it
    fn on_error(&self, error: DataError);

    /// The shared filter selection changed; re-execute as appropriate
    fn on_filter_change(&self);
}

/// Dispatches queries for registered clients and fans filter changes out
/// to them.
///
/// Holds clients weakly: dropping a client (or a table binding) is enough
/// to detach it. Must be created inside a tokio runtime; refreshes are
/// spawned onto it.
pub struct Coordinator {
    backend: Arc<dyn QueryBackend>,
    filter: Arc<FilterHandle>,
    clients: RwLock<Vec<Weak<dyn QueryClient>>>,
    runtime: tokio::runtime::Handle,
}

impl Coordinator {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            backend,
            filter: Arc::new(FilterHandle::new()),
            clients: RwLock::new(Vec::new()),
            runtime: tokio::runtime::Handle::current(),
        });
        coordinator
            .filter
            .subscribe(coordinator.clone() as Arc<dyn FilterSubscriber>);
        coordinator
    }

    /// The shared filter selection
    pub fn filter(&self) -> &Arc<FilterHandle> {
        &self.filter
    }

    pub fn connect(&self, client: Arc<dyn QueryClient>) {
        self.clients.write().push(Arc::downgrade(&client));
    }

    pub fn disconnect(&self, client: &Arc<dyn QueryClient>) {
        self.clients.write().retain(|weak| {
            weak.upgrade()
                .map_or(false, |candidate| !Arc::ptr_eq(&candidate, client))
        });
    }

    /// Fire-and-forget refresh of one client
    pub fn request_update(&self, client: Arc<dyn QueryClient>) {
        let backend = self.backend.clone();
        let filter = self.filter.get();
        self.runtime.spawn(async move {
            Self::run(backend, filter, client).await;
        });
    }

    /// Awaitable refresh of one client
    pub async fn refresh(&self, client: &Arc<dyn QueryClient>) {
        Self::run(self.backend.clone(), self.filter.get(), client.clone()).await;
    }

    pub async fn field_info(&self, table: &str) -> anyhow::Result<Vec<FieldInfo>> {
        self.backend.field_info(table).await
    }

    async fn run(
        backend: Arc<dyn QueryBackend>,
        filter: Option<Expr>,
        client: Arc<dyn QueryClient>,
    ) {
        let Some(query) = client.build_query(filter.as_ref()) else {
            return;
        };
        match backend.execute(&query.to_sql()).await {
            Ok(batch) => client.on_result(batch),
            Err(error) => {
                warn!(%error, "query execution failed");
                client.on_error(DataError::QueryExecution(error.to_string()));
            }
        }
    }
}

impl FilterSubscriber for Coordinator {
    fn on_filter_change(&self) {
        let mut clients = self.clients.write();
        clients.retain(|weak| weak.strong_count() > 0);
        for weak in clients.iter() {
            if let Some(client) = weak.upgrade() {
                client.on_filter_change();
            }
        }
    }
}

/// Extract one transport cell from a result batch column.
///
/// Backends deliver the scalar shapes below; anything else reads as null.
pub(crate) fn raw_cell(column: &ArrayRef, row: usize) -> RawCell<'_> {
    if column.is_null(row) {
        return RawCell::Null;
    }
    match column.data_type() {
        DataType::Int64 => {
            let array = column.as_any().downcast_ref::<Int64Array>().unwrap();
            RawCell::Int(array.value(row))
        }
        DataType::Int32 => {
            let array = column.as_any().downcast_ref::<Int32Array>().unwrap();
            RawCell::Int(array.value(row) as i64)
        }
        DataType::Float64 => {
            let array = column.as_any().downcast_ref::<Float64Array>().unwrap();
            RawCell::Float(array.value(row))
        }
        DataType::Float32 => {
            let array = column.as_any().downcast_ref::<Float32Array>().unwrap();
            RawCell::Float(array.value(row) as f64)
        }
        DataType::Boolean => {
            let array = column.as_any().downcast_ref::<BooleanArray>().unwrap();
            RawCell::Bool(array.value(row))
        }
        DataType::Utf8 => {
            let array = column.as_any().downcast_ref::<StringArray>().unwrap();
            RawCell::Text(array.value(row))
        }
        _ => RawCell::Null,
    }
}
