//! Ingestion Module
//!
//! Moves record keys from input files into a two-column table with:
//! - Format detection (JSON / line-delimited text)
//! - Validation
//! - Deduplication against the stored keys
//! - Monotonic identifier assignment
//! - A single batched columnar write

pub mod assigner;
pub mod columnar_writer;
pub mod connector;
pub mod json_connector;
pub mod line_connector;
pub mod orchestrator;
pub mod snapshot;
pub mod validator;

pub use assigner::{AssignedRecord, Assignment, DedupAssigner, DedupScope};
pub use columnar_writer::ColumnarWriter;
pub use connector::{InputFormat, RecordSource};
pub use json_connector::{JsonConnector, DEFAULT_JSON_POINTER};
pub use line_connector::LineConnector;
pub use orchestrator::{IngestionOptions, IngestionOrchestrator};
pub use snapshot::{read_snapshot, ExistingSnapshot};
pub use validator::{validate, validate_all, RecordKey};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ingestion result
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IngestionResult {
    /// Number of records newly written
    pub accepted: u64,

    /// Number of records recognised as already present
    pub duplicates: u64,

    /// Target table as `database.table`
    pub table: String,

    /// First identifier assigned in this run
    pub first_id: Option<u64>,

    /// Last identifier assigned in this run
    pub last_id: Option<u64>,

    /// Ingestion run ID
    pub run_id: String,

    /// When the write step finished
    pub completed_at: DateTime<Utc>,
}
