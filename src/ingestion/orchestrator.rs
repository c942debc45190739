//! Ingestion Orchestrator - Runs one `add` call end to end
//!
//! Parse -> Validate -> Read snapshot -> Assign -> Write. Any failure before
//! the write aborts the call without touching the table.

use crate::error::Result;
use crate::ingestion::assigner::{DedupAssigner, DedupScope};
use crate::ingestion::columnar_writer::ColumnarWriter;
use crate::ingestion::connector::InputFormat;
use crate::ingestion::json_connector::DEFAULT_JSON_POINTER;
use crate::ingestion::snapshot::read_snapshot;
use crate::ingestion::validator::validate_all;
use crate::ingestion::IngestionResult;
use crate::schema::{TableRef, TableScheme};
use crate::store::StoreClient;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

/// Options controlling how input is read and reconciled
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionOptions {
    /// JSON pointer to the array of records in `.json` inputs
    pub json_pointer: String,

    /// Whether keys repeated within one input count as duplicates
    pub dedup_scope: DedupScope,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            json_pointer: DEFAULT_JSON_POINTER.to_string(),
            dedup_scope: DedupScope::default(),
        }
    }
}

/// Ingestion Orchestrator - Coordinates one ingestion call against one table
pub struct IngestionOrchestrator<'a> {
    client: &'a dyn StoreClient,
    table: &'a TableRef,
    scheme: &'a TableScheme,
    options: &'a IngestionOptions,
}

impl<'a> IngestionOrchestrator<'a> {
    pub fn new(
        client: &'a dyn StoreClient,
        table: &'a TableRef,
        scheme: &'a TableScheme,
        options: &'a IngestionOptions,
    ) -> Self {
        Self {
            client,
            table,
            scheme,
            options,
        }
    }

    /// Ingest the records of `path` into the table.
    ///
    /// The caller must make sure no other ingestion call targets the same
    /// table concurrently: the snapshot read and the insert are not atomic
    /// together.
    pub fn add(&self, path: &Path) -> Result<IngestionResult> {
        let run_id = Uuid::new_v4().to_string();
        info!(
            "Ingestion run {} started: {} -> {}",
            run_id,
            path.display(),
            self.table
        );

        // Parse and validate everything before looking at the store
        let format = InputFormat::from_path(path, &self.options.json_pointer);
        let candidates = format.read_file(path)?;
        let parsed = candidates.len();
        let keys = validate_all(candidates)?;
        debug!("Validated {} of {} parsed records", keys.len(), parsed);

        let snapshot = read_snapshot(self.client, self.table, self.scheme)?;
        info!(
            "Existing snapshot of {}: {} keys, max id {}",
            self.table,
            snapshot.len(),
            snapshot.max_id()
        );

        let assignment = DedupAssigner::new(self.options.dedup_scope).assign(keys, &snapshot)?;
        drop(snapshot);

        ColumnarWriter::new(self.client).write(self.table, self.scheme, &assignment.accepted)?;

        let result = IngestionResult {
            accepted: assignment.accepted.len() as u64,
            duplicates: assignment.duplicates.len() as u64,
            table: self.table.to_string(),
            first_id: assignment.first_id(),
            last_id: assignment.last_id(),
            run_id,
            completed_at: Utc::now(),
        };
        info!(
            "Ingestion run {} finished: pushed {}, duplicated {}",
            result.run_id, result.accepted, result.duplicates
        );
        Ok(result)
    }
}
