//! Record Validator - Rejects malformed candidate records before reconciliation

use crate::error::{FillerError, Result};
use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

/// A validated, non-empty record key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Borrow<str> for RecordKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for RecordKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Validate one candidate found at `position` in the parsed input
pub fn validate(position: usize, candidate: String) -> Result<RecordKey> {
    if candidate.is_empty() {
        return Err(FillerError::Validation {
            position,
            reason: "empty record".to_string(),
        });
    }
    Ok(RecordKey(candidate))
}

/// Validate every candidate in order; the first failure aborts the whole batch
pub fn validate_all(candidates: Vec<String>) -> Result<Vec<RecordKey>> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(position, candidate)| validate(position, candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_records_pass() {
        let keys = validate_all(vec!["a".into(), " ".into(), "b".into()]).unwrap();
        assert_eq!(keys, vec!["a", " ", "b"]);
    }

    #[test]
    fn test_empty_record_fails_with_position() {
        let err = validate_all(vec!["a".into(), "".into(), "".into()]).unwrap_err();
        assert!(matches!(err, FillerError::Validation { position: 1, .. }));
    }

    #[test]
    fn test_empty_batch_is_valid() {
        assert!(validate_all(Vec::new()).unwrap().is_empty());
    }
}
