//! Store Reader - Builds the snapshot of keys already present in the table

use crate::error::{FillerError, Result};
use crate::schema::{TableRef, TableScheme};
use crate::store::{SelectQuery, StoreClient, StoreError, StoreResult};
use arrow::array::{Array, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Keys and maximum identifier currently stored in a table.
///
/// Taken fresh for every ingestion call and dropped at its end.
#[derive(Clone, Debug, Default)]
pub struct ExistingSnapshot {
    keys: HashSet<String>,
    max_id: u64,
    rows_scanned: u64,
}

impl ExistingSnapshot {
    /// Build a snapshot from `(identifier, key)` rows
    pub fn from_rows<I, K>(rows: I) -> Self
    where
        I: IntoIterator<Item = (u64, K)>,
        K: Into<String>,
    {
        let mut snapshot = Self::default();
        for (id, key) in rows {
            snapshot.observe(id, key.into());
        }
        snapshot
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Highest stored identifier, 0 for an empty table
    pub fn max_id(&self) -> u64 {
        self.max_id
    }

    /// Number of distinct stored keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn rows_scanned(&self) -> u64 {
        self.rows_scanned
    }

    fn observe(&mut self, id: u64, key: String) {
        self.keys.insert(key);
        self.max_id = self.max_id.max(id);
        self.rows_scanned += 1;
    }

    fn absorb_block(&mut self, block: &RecordBatch) -> StoreResult<()> {
        if block.num_columns() < 2 {
            return Err(StoreError::BlockLayout(format!(
                "expected (identifier, key) columns, got {}",
                block.num_columns()
            )));
        }

        let ids = block
            .column(0)
            .as_any()
            .downcast_ref::<UInt64Array>()
            .ok_or_else(|| {
                StoreError::BlockLayout(format!(
                    "identifier column is {}, expected UInt64",
                    block.column(0).data_type()
                ))
            })?;
        let keys = block
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                StoreError::BlockLayout(format!(
                    "key column is {}, expected Utf8",
                    block.column(1).data_type()
                ))
            })?;

        for row in 0..block.num_rows() {
            if ids.is_null(row) || keys.is_null(row) {
                return Err(StoreError::BlockLayout(format!("null value in row {}", row)));
            }
            self.observe(ids.value(row), keys.value(row).to_string());
        }
        Ok(())
    }
}

/// Scan the whole table, ordered by identifier, into an `ExistingSnapshot`
pub fn read_snapshot(
    client: &dyn StoreClient,
    table: &TableRef,
    scheme: &TableScheme,
) -> Result<ExistingSnapshot> {
    let mut snapshot = ExistingSnapshot::default();
    let query = SelectQuery::by_identifier(table, scheme);

    client
        .select(&query, &mut |block| snapshot.absorb_block(block))
        .map_err(FillerError::StoreRead)?;

    if (snapshot.len() as u64) < snapshot.rows_scanned() {
        warn!(
            "Table {} holds {} rows but only {} distinct keys",
            table,
            snapshot.rows_scanned(),
            snapshot.len()
        );
    }
    debug!(
        "Snapshot of {}: {} keys, max id {}",
        table,
        snapshot.len(),
        snapshot.max_id()
    );
    Ok(snapshot)
}
