//! Deduplicating Assigner - Splits validated records into new and duplicate
//! and hands out identifiers to the new ones

use crate::error::{FillerError, Result};
use crate::ingestion::snapshot::ExistingSnapshot;
use crate::ingestion::validator::RecordKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Which keys a candidate is checked against
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// Stored keys and keys already accepted earlier in the same input
    #[default]
    SnapshotAndBatch,

    /// Stored keys only; a key repeated within one input is accepted again
    /// under a new identifier
    SnapshotOnly,
}

impl FromStr for DedupScope {
    type Err = FillerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "snapshot_and_batch" => Ok(DedupScope::SnapshotAndBatch),
            "snapshot_only" => Ok(DedupScope::SnapshotOnly),
            other => Err(FillerError::Config(format!(
                "unknown dedup scope '{}' (expected snapshot_and_batch or snapshot_only)",
                other
            ))),
        }
    }
}

/// A new record and the identifier it was given
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AssignedRecord {
    pub id: u64,
    pub key: RecordKey,
}

/// Outcome of one assignment pass, both lists in input order
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    pub accepted: Vec<AssignedRecord>,
    pub duplicates: Vec<RecordKey>,
}

impl Assignment {
    pub fn first_id(&self) -> Option<u64> {
        self.accepted.first().map(|r| r.id)
    }

    pub fn last_id(&self) -> Option<u64> {
        self.accepted.last().map(|r| r.id)
    }
}

/// Deduplicating Assigner
#[derive(Clone, Copy, Debug, Default)]
pub struct DedupAssigner {
    scope: DedupScope,
}

impl DedupAssigner {
    pub fn new(scope: DedupScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> DedupScope {
        self.scope
    }

    /// Partition `keys` against `snapshot`.
    ///
    /// Identifiers continue from the snapshot's maximum, one per accepted
    /// record, in input order. Duplicates never consume an identifier.
    pub fn assign(&self, keys: Vec<RecordKey>, snapshot: &ExistingSnapshot) -> Result<Assignment> {
        let mut assignment = Assignment::default();
        let mut accepted_keys: HashSet<RecordKey> = HashSet::new();
        let mut running_max = snapshot.max_id();

        for key in keys {
            let seen_in_batch = self.scope == DedupScope::SnapshotAndBatch
                && accepted_keys.contains(key.as_str());

            if seen_in_batch || snapshot.contains(key.as_str()) {
                assignment.duplicates.push(key);
                continue;
            }

            running_max = running_max
                .checked_add(1)
                .ok_or(FillerError::IdentifierExhausted)?;
            if self.scope == DedupScope::SnapshotAndBatch {
                accepted_keys.insert(key.clone());
            }
            assignment.accepted.push(AssignedRecord {
                id: running_max,
                key,
            });
        }

        Ok(assignment)
    }
}
