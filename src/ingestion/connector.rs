//! Record Source Trait - Abstract interface for input formats

use crate::error::{FillerError, Result};
use crate::ingestion::json_connector::JsonConnector;
use crate::ingestion::line_connector::LineConnector;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Record Source Trait
///
/// Implementations:
/// - JsonConnector: array of strings at a JSON pointer
/// - LineConnector: one record per line
pub trait RecordSource {
    /// Read every candidate record, in source order
    fn read_records(&self, reader: &mut dyn BufRead) -> Result<Vec<String>>;

    /// Get source type (e.g., "json", "lines")
    fn source_type(&self) -> &str;
}

/// Input format, chosen once from the file extension
#[derive(Clone, Debug)]
pub enum InputFormat {
    Json(JsonConnector),
    Lines(LineConnector),
}

impl InputFormat {
    /// `.json` files are parsed as JSON, anything else as line-delimited text
    pub fn from_path(path: &Path, json_pointer: &str) -> Self {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            InputFormat::Json(JsonConnector::new(json_pointer))
        } else {
            InputFormat::Lines(LineConnector::new())
        }
    }

    pub fn source(&self) -> &dyn RecordSource {
        match self {
            InputFormat::Json(connector) => connector,
            InputFormat::Lines(connector) => connector,
        }
    }

    /// Open `path` and parse it with this format
    pub fn read_file(&self, path: &Path) -> Result<Vec<String>> {
        let file = File::open(path).map_err(|source| FillerError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let records = self.source().read_records(&mut reader)?;
        debug!(
            "Parsed {} records from {} as {}",
            records.len(),
            path.display(),
            self.source().source_type()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        let pointer = "/data/drivers";
        assert!(matches!(
            InputFormat::from_path(Path::new("data.json"), pointer),
            InputFormat::Json(_)
        ));
        assert!(matches!(
            InputFormat::from_path(Path::new("DATA.JSON"), pointer),
            InputFormat::Json(_)
        ));
        assert!(matches!(
            InputFormat::from_path(Path::new("data.csv"), pointer),
            InputFormat::Lines(_)
        ));
        assert!(matches!(
            InputFormat::from_path(Path::new("drivers"), pointer),
            InputFormat::Lines(_)
        ));
        assert!(matches!(
            InputFormat::from_path(Path::new("data.json.bak"), pointer),
            InputFormat::Lines(_)
        ));
    }

    #[test]
    fn test_missing_file_is_file_open_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.csv");
        let format = InputFormat::from_path(&path, "/data/drivers");

        let err = format.read_file(&path).unwrap_err();
        assert!(matches!(err, FillerError::FileOpen { .. }));
    }

    #[test]
    fn test_read_file_dispatches_on_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        let mut file = File::create(&path).unwrap();
        write!(file, r#"{{"data": {{"drivers": ["x", "y"]}}}}"#).unwrap();

        let format = InputFormat::from_path(&path, "/data/drivers");
        assert_eq!(format.read_file(&path).unwrap(), vec!["x", "y"]);
    }
}
