//! Columnar Writer - Writes accepted records as one columnar block

use crate::error::{FillerError, Result};
use crate::ingestion::assigner::AssignedRecord;
use crate::schema::{TableRef, TableScheme};
use crate::store::{StoreClient, StoreError};
use arrow::array::{ArrayRef, StringArray, UInt64Array};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tracing::debug;

/// Columnar Writer
pub struct ColumnarWriter<'a> {
    client: &'a dyn StoreClient,
}

impl<'a> ColumnarWriter<'a> {
    pub fn new(client: &'a dyn StoreClient) -> Self {
        Self { client }
    }

    /// Lay the records out as (identifiers, keys), named after the scheme's
    /// first and second columns
    pub fn build_block(scheme: &TableScheme, records: &[AssignedRecord]) -> Result<RecordBatch> {
        let ids = records.iter().map(|r| r.id).collect::<Vec<_>>();
        let keys = records.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(UInt64Array::from(ids)),
            Arc::new(StringArray::from(keys)),
        ];

        RecordBatch::try_new(scheme.arrow_schema(), columns)
            .map_err(|e| FillerError::StoreWrite(StoreError::Arrow(e)))
    }

    /// Insert `records` in a single batched call, returning the row count.
    /// Nothing is sent when there is nothing to write.
    pub fn write(
        &self,
        table: &TableRef,
        scheme: &TableScheme,
        records: &[AssignedRecord],
    ) -> Result<usize> {
        if records.is_empty() {
            debug!("No new records for {}, skipping insert", table);
            return Ok(0);
        }

        let block = Self::build_block(scheme, records)?;
        self.client
            .insert(table, &block)
            .map_err(FillerError::StoreWrite)?;

        Ok(block.num_rows())
    }
}
