//! SQLite execution backend
//!
//! Runs coordinator queries against an embedded SQLite database. Useful
//! for hosts without an external analytic engine and for exercising the
//! client pair end-to-end.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::{FieldInfo, QueryBackend};
use crate::DataError;

/// One materialized cell, collected before column types are decided
#[derive(Debug, Clone)]
enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Open a database file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a fresh in-memory database
    pub fn open_in_memory() -> Result<Self, DataError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run DDL/DML directly, outside the query protocol
    pub fn execute_batch(&self, sql: &str) -> Result<(), DataError> {
        self.conn.lock().execute_batch(sql)?;
        Ok(())
    }

    fn run_query(conn: &Connection, sql: &str) -> Result<RecordBatch, DataError> {
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (idx, column) in cells.iter_mut().enumerate() {
                let cell = match row.get_ref(idx)? {
                    ValueRef::Null => Cell::Null,
                    ValueRef::Integer(i) => Cell::Int(i),
                    ValueRef::Real(f) => Cell::Real(f),
                    ValueRef::Text(s) => {
                        Cell::Text(String::from_utf8_lossy(s).into_owned())
                    }
                    ValueRef::Blob(b) => Cell::Text(hex_encode(b)),
                };
                column.push(cell);
            }
        }

        build_batch(names, cells)
    }

    fn table_info(conn: &Connection, table: &str) -> Result<Vec<FieldInfo>, DataError> {
        let sql = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(FieldInfo {
                column: row.get::<_, String>(1)?,
                sql_type: row.get::<_, String>(2)?,
            })
        })?;

        let mut fields = Vec::new();
        for field in rows {
            fields.push(field?);
        }
        Ok(fields)
    }
}

#[async_trait]
impl QueryBackend for SqliteBackend {
    async fn execute(&self, sql: &str) -> anyhow::Result<RecordBatch> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let batch = tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            Self::run_query(&conn, &sql)
        })
        .await??;
        Ok(batch)
    }

    async fn field_info(&self, table: &str) -> anyhow::Result<Vec<FieldInfo>> {
        let conn = self.conn.clone();
        let table = table.to_string();
        let fields = tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            Self::table_info(&conn, &table)
        })
        .await??;
        Ok(fields)
    }
}

/// Decide each column's arrow type from the cells observed and build the
/// batch. Text dominates mixed columns; reals dominate integers.
fn build_batch(names: Vec<String>, cells: Vec<Vec<Cell>>) -> Result<RecordBatch, DataError> {
    let mut fields = Vec::with_capacity(names.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(names.len());

    for (name, column) in names.into_iter().zip(cells) {
        let has_text = column.iter().any(|c| matches!(c, Cell::Text(_)));
        let has_real = column.iter().any(|c| matches!(c, Cell::Real(_)));
        let has_int = column.iter().any(|c| matches!(c, Cell::Int(_)));

        let (data_type, array): (DataType, ArrayRef) = if has_text || !(has_real || has_int) {
            let mut builder = StringBuilder::new();
            for cell in &column {
                match cell {
                    Cell::Null => builder.append_null(),
                    Cell::Int(i) => builder.append_value(i.to_string()),
                    Cell::Real(f) => builder.append_value(f.to_string()),
                    Cell::Text(s) => builder.append_value(s),
                }
            }
            (DataType::Utf8, Arc::new(builder.finish()))
        } else if has_real {
            let mut builder = Float64Builder::new();
            for cell in &column {
                match cell {
                    Cell::Null => builder.append_null(),
                    Cell::Int(i) => builder.append_value(*i as f64),
                    Cell::Real(f) => builder.append_value(*f),
                    Cell::Text(_) => builder.append_null(),
                }
            }
            (DataType::Float64, Arc::new(builder.finish()))
        } else {
            let mut builder = Int64Builder::new();
            for cell in &column {
                match cell {
                    Cell::Null => builder.append_null(),
                    Cell::Int(i) => builder.append_value(*i),
                    _ => builder.append_null(),
                }
            }
            (DataType::Int64, Arc::new(builder.finish()))
        };

        fields.push(Field::new(&name, data_type, true));
        arrays.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(DataError::Arrow)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
