//! Windowed data model and query clients for the virtualized table viewer
//!
//! This crate owns everything between the analytic engine and the scroll
//! core: the value pipeline that parses transported cells, the sparse
//! positional row store, the SQL builder, and the coordinator/client
//! protocol with its row-window and count clients.

pub mod client;
pub mod filter;
pub mod model;
pub mod sql;
pub mod table;
pub mod values;

use arrow::error::ArrowError;
use thiserror::Error;

// Re-exports
pub use client::{Coordinator, CountClient, FieldInfo, QueryBackend, QueryClient, RowWindowClient};
pub use client::sqlite::SqliteBackend;
pub use filter::FilterHandle;
pub use model::SparseRowStore;
pub use sql::{column, Expr, Query};
pub use table::TableBinding;
pub use values::{parse_value, RawCell, RowRecord, Value};

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("SQLite error: {0}")]
    Sqlite(String),

    #[error("schema fetch failed: {0}")]
    SchemaFetch(String),

    #[error("query execution failed: {0}")]
    QueryExecution(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<rusqlite::Error> for DataError {
    fn from(error: rusqlite::Error) -> Self {
        DataError::Sqlite(error.to_string())
    }
}
