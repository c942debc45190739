//! Table Filler
//!
//! Loads record keys from JSON or line-delimited files into a two-column
//! `(identifier, key)` table, skipping keys the table already holds and
//! numbering the new ones after the current maximum identifier.

pub mod config;
pub mod error;
pub mod filler;
pub mod ingestion;
pub mod schema;
pub mod store;

pub use config::FillerConfig;
pub use error::{FillerError, Result};
pub use filler::TableFiller;
pub use ingestion::{DedupScope, IngestionOptions, IngestionResult};
pub use schema::{ColumnSpec, ColumnType, TableRef, TableScheme};
pub use store::{SqliteClient, StoreClient, StoreError};
