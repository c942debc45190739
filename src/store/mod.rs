//! Store Client - Abstract interface to the backing column store
//!
//! The ingestion pipeline never owns a connection. Callers hand it a
//! `&dyn StoreClient`, so the same pipeline runs against SQLite, a test
//! double, or any other backend able to scan and bulk-insert columnar blocks.

pub mod sqlite;

pub use sqlite::SqliteClient;

use crate::schema::{TableRef, TableScheme};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use thiserror::Error;

/// Backend-level failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("unknown database '{0}'")]
    UnknownDatabase(String),

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("unsupported column '{name}' of type {data_type}")]
    UnsupportedColumn { name: String, data_type: String },

    #[error("unexpected block layout: {0}")]
    BlockLayout(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Schema statements issued during setup
#[derive(Clone, Copy, Debug)]
pub enum Ddl<'a> {
    /// `CREATE DATABASE IF NOT EXISTS`
    CreateDatabase(&'a str),

    /// `CREATE TABLE IF NOT EXISTS`
    CreateTable {
        table: &'a TableRef,
        scheme: &'a TableScheme,
    },

    /// `DROP TABLE IF EXISTS`, a no-op for absent tables
    DropTable(&'a TableRef),
}

/// Full scan of a table's columns, ordered ascending by one of them
#[derive(Clone, Copy, Debug)]
pub struct SelectQuery<'a> {
    pub table: &'a TableRef,
    pub scheme: &'a TableScheme,
    pub order_by: &'a str,
}

impl<'a> SelectQuery<'a> {
    /// Scan ordered by the scheme's identifier column
    pub fn by_identifier(table: &'a TableRef, scheme: &'a TableScheme) -> Self {
        let order_by = scheme
            .identifier_column()
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        Self {
            table,
            scheme,
            order_by,
        }
    }
}

/// Store capability consumed by the filler.
///
/// Implementations:
/// - SqliteClient: attached SQLite databases, one file per database
/// - test doubles in the test suites
pub trait StoreClient {
    /// Run a schema statement
    fn execute(&self, ddl: &Ddl<'_>) -> StoreResult<()>;

    /// Stream every row matched by `query` to `on_block`, in columnar blocks
    fn select(
        &self,
        query: &SelectQuery<'_>,
        on_block: &mut dyn FnMut(&RecordBatch) -> StoreResult<()>,
    ) -> StoreResult<()>;

    /// Write a columnar block in one batched call
    fn insert(&self, table: &TableRef, block: &RecordBatch) -> StoreResult<()>;
}
