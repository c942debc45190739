//! Line Connector - One record key per line of text

use crate::error::{FillerError, Result};
use crate::ingestion::connector::RecordSource;
use std::io::BufRead;

/// Line Connector - Splits the input on newlines, keeping file order.
///
/// Only the line terminator (`\n` or `\r\n`) is removed; other whitespace is
/// part of the record.
#[derive(Clone, Debug, Default)]
pub struct LineConnector;

impl LineConnector {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSource for LineConnector {
    fn read_records(&self, reader: &mut dyn BufRead) -> Result<Vec<String>> {
        BufRead::lines(reader)
            .enumerate()
            .map(|(idx, line)| {
                line.map_err(|e| FillerError::Parse(format!("line {}: {}", idx + 1, e)))
            })
            .collect()
    }

    fn source_type(&self) -> &str {
        "lines"
    }
}
