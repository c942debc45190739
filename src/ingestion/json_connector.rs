//! JSON Connector - Extracts an array of record keys from a JSON document

use crate::error::{FillerError, Result};
use crate::ingestion::connector::RecordSource;
use serde_json::Value;
use std::io::BufRead;

/// Default location of the records: `{"data": {"drivers": [...]}}`
pub const DEFAULT_JSON_POINTER: &str = "/data/drivers";

/// JSON Connector - Reads the string array found at `json_pointer`
#[derive(Clone, Debug)]
pub struct JsonConnector {
    json_pointer: String,
}

impl JsonConnector {
    pub fn new(json_pointer: impl Into<String>) -> Self {
        Self {
            json_pointer: json_pointer.into(),
        }
    }

    pub fn json_pointer(&self) -> &str {
        &self.json_pointer
    }

    fn extract(&self, document: &Value) -> Result<Vec<String>> {
        let entries = document.pointer(&self.json_pointer).ok_or_else(|| {
            FillerError::Parse(format!("no value at '{}'", self.json_pointer))
        })?;

        let entries = entries.as_array().ok_or_else(|| {
            FillerError::Parse(format!("value at '{}' is not an array", self.json_pointer))
        })?;

        entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                entry.as_str().map(str::to_string).ok_or_else(|| {
                    FillerError::Parse(format!(
                        "entry #{} at '{}' is not a string: {}",
                        idx, self.json_pointer, entry
                    ))
                })
            })
            .collect()
    }
}

impl Default for JsonConnector {
    fn default() -> Self {
        Self::new(DEFAULT_JSON_POINTER)
    }
}

impl RecordSource for JsonConnector {
    fn read_records(&self, reader: &mut dyn BufRead) -> Result<Vec<String>> {
        let document: Value = serde_json::from_reader(reader)
            .map_err(|e| FillerError::Parse(format!("malformed JSON: {}", e)))?;
        self.extract(&document)
    }

    fn source_type(&self) -> &str {
        "json"
    }
}
