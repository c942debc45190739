//! Table Scheme - Column types, the two-column table shape and table references

use crate::error::{FillerError, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Column types understood by the filler.
///
/// Names follow the column store's type names (`UInt64`, `String`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    UInt64,
    String,
}

impl ColumnType {
    pub fn arrow_type(&self) -> DataType {
        match self {
            ColumnType::UInt64 => DataType::UInt64,
            ColumnType::String => DataType::Utf8,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::UInt64 => write!(f, "UInt64"),
            ColumnType::String => write!(f, "String"),
        }
    }
}

/// One `(name, type)` pair of a table scheme
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered list of table columns.
///
/// The ingestion pipeline treats the first column as the record identifier
/// and the second as the record key, whatever they are called.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableScheme {
    columns: Vec<ColumnSpec>,
}

impl TableScheme {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn identifier_column(&self) -> Option<&ColumnSpec> {
        self.columns.first()
    }

    pub fn key_column(&self) -> Option<&ColumnSpec> {
        self.columns.get(1)
    }

    /// Check the scheme is the `(UInt64, String)` shape with valid names
    pub fn validate(&self) -> Result<()> {
        if self.columns.len() != 2 {
            return Err(FillerError::Schema(format!(
                "expected exactly two columns (identifier, key), got {}",
                self.columns.len()
            )));
        }
        for column in &self.columns {
            validate_identifier(&column.name)?;
        }
        if self.columns[0].column_type != ColumnType::UInt64 {
            return Err(FillerError::Schema(format!(
                "identifier column '{}' must be UInt64, got {}",
                self.columns[0].name, self.columns[0].column_type
            )));
        }
        if self.columns[1].column_type != ColumnType::String {
            return Err(FillerError::Schema(format!(
                "key column '{}' must be String, got {}",
                self.columns[1].name, self.columns[1].column_type
            )));
        }
        if self.columns[0].name == self.columns[1].name {
            return Err(FillerError::Schema(format!(
                "duplicate column name '{}'",
                self.columns[0].name
            )));
        }
        Ok(())
    }

    /// Arrow schema of the columnar blocks exchanged with the store
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields = self
            .columns
            .iter()
            .map(|c| Field::new(c.name.as_str(), c.column_type.arrow_type(), false))
            .collect::<Vec<_>>();
        Arc::new(Schema::new(fields))
    }

    /// Renders the scheme as `(id UInt64, hash_id String)`
    pub fn creation_scheme(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type))
            .collect::<Vec<_>>();
        format!("({})", columns.join(", "))
    }
}

impl Default for TableScheme {
    fn default() -> Self {
        Self::new(vec![
            ColumnSpec::new("id", ColumnType::UInt64),
            ColumnSpec::new("hash_id", ColumnType::String),
        ])
    }
}

/// Fully qualified `database.table` reference
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub database: String,
    pub table: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.database)?;
        validate_identifier(&self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// Database, table and column names must be plain identifiers
pub fn validate_identifier(name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(FillerError::Schema(format!("invalid identifier '{}'", name)))
    }
}
