use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum FillerError {
    #[error("can't open file {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("validation failed for record #{position}: {reason}")]
    Validation { position: usize, reason: String },

    #[error("Store read error: {0}")]
    StoreRead(#[source] StoreError),

    #[error("Store write error: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("identifier space exhausted: cannot assign an id above {}", u64::MAX)]
    IdentifierExhausted,
}

pub type Result<T> = std::result::Result<T, FillerError>;
