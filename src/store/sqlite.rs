//! SQLite Store - StoreClient backed by rusqlite
//!
//! Every database is an attached SQLite file named `<database>.db`, placed
//! next to the main store file (or an attached in-memory database when the
//! store itself is in memory). Tables are addressed as `database.table`.

use crate::schema::{ColumnType, TableRef, TableScheme};
use crate::store::{Ddl, SelectQuery, StoreClient, StoreError, StoreResult};
use arrow::array::{Array, ArrayRef, StringArray, StringBuilder, UInt64Array, UInt64Builder};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// SQLite-backed store client
pub struct SqliteClient {
    conn: Connection,

    /// Directory holding attached database files (None for in-memory stores)
    attach_dir: Option<PathBuf>,

    /// Maximum number of rows per block handed to `select` callbacks
    block_rows: usize,
}

impl SqliteClient {
    pub const DEFAULT_BLOCK_ROWS: usize = 65_536;

    /// Open (or create) a file-backed store
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let attach_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if !attach_dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&attach_dir)?;
        }

        let conn = Connection::open(path)?;
        debug!("Opened SQLite store at {}", path.display());

        Ok(Self {
            conn,
            attach_dir: Some(attach_dir),
            block_rows: Self::DEFAULT_BLOCK_ROWS,
        })
    }

    /// Open a store that lives only as long as this client
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            attach_dir: None,
            block_rows: Self::DEFAULT_BLOCK_ROWS,
        })
    }

    pub fn with_block_rows(mut self, block_rows: usize) -> Self {
        self.block_rows = block_rows.max(1);
        self
    }

    fn is_attached(&self, database: &str) -> StoreResult<bool> {
        let mut stmt = self.conn.prepare("PRAGMA database_list")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names.iter().any(|n| n == database))
    }

    fn ensure_attached(&self, database: &str) -> StoreResult<()> {
        if self.is_attached(database)? {
            Ok(())
        } else {
            Err(StoreError::UnknownDatabase(database.to_string()))
        }
    }

    fn create_database(&self, database: &str) -> StoreResult<()> {
        if self.is_attached(database)? {
            return Ok(());
        }

        let location = match &self.attach_dir {
            Some(dir) => dir
                .join(format!("{}.db", database))
                .to_string_lossy()
                .into_owned(),
            None => ":memory:".to_string(),
        };
        self.conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", quote(database)),
            [&location],
        )?;
        debug!("Attached database {} at {}", database, location);
        Ok(())
    }

    fn create_table(&self, table: &TableRef, scheme: &TableScheme) -> StoreResult<()> {
        self.ensure_attached(&table.database)?;

        let columns = scheme
            .columns()
            .iter()
            .map(|c| format!("{} {} NOT NULL", quote(&c.name), sql_type(c.column_type)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            qualified(table),
            columns
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    fn drop_table(&self, table: &TableRef) -> StoreResult<()> {
        // An unattached database cannot hold the table
        if !self.is_attached(&table.database)? {
            return Ok(());
        }
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", qualified(table)))?;
        Ok(())
    }
}

impl StoreClient for SqliteClient {
    fn execute(&self, ddl: &Ddl<'_>) -> StoreResult<()> {
        match ddl {
            Ddl::CreateDatabase(name) => self.create_database(name),
            Ddl::CreateTable { table, scheme } => self.create_table(table, scheme),
            Ddl::DropTable(table) => self.drop_table(table),
        }
    }

    fn select(
        &self,
        query: &SelectQuery<'_>,
        on_block: &mut dyn FnMut(&RecordBatch) -> StoreResult<()>,
    ) -> StoreResult<()> {
        self.ensure_attached(&query.table.database)?;

        let columns = query
            .scheme
            .columns()
            .iter()
            .map(|c| quote(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} ASC",
            columns,
            qualified(query.table),
            quote(query.order_by)
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut block = BlockBuilder::new(query.scheme);

        while let Some(row) = rows.next()? {
            block.append_row(row)?;
            if block.len() >= self.block_rows {
                on_block(&block.finish()?)?;
            }
        }
        if !block.is_empty() {
            on_block(&block.finish()?)?;
        }
        Ok(())
    }

    fn insert(&self, table: &TableRef, block: &RecordBatch) -> StoreResult<()> {
        self.ensure_attached(&table.database)?;

        let schema = block.schema();
        let columns = schema
            .fields()
            .iter()
            .map(|f| quote(f.name()))
            .collect::<Vec<_>>();
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified(table),
            columns.join(", "),
            placeholders.join(", ")
        );

        let values = block
            .columns()
            .iter()
            .zip(schema.fields().iter())
            .map(|(array, field)| ColumnValues::from_array(field.name(), array))
            .collect::<StoreResult<Vec<_>>>()?;

        // One transaction per block: either every row lands or none does
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in 0..block.num_rows() {
                let params = values
                    .iter()
                    .map(|column| column.value_at(row))
                    .collect::<StoreResult<Vec<_>>>()?;
                stmt.execute(params_from_iter(params))?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} rows into {}", block.num_rows(), table);
        Ok(())
    }
}

/// Accumulates scanned rows into typed Arrow builders
struct BlockBuilder {
    schema: SchemaRef,
    columns: Vec<ColumnBuilder>,
    rows: usize,
}

enum ColumnBuilder {
    UInt64(UInt64Builder),
    String(StringBuilder),
}

impl BlockBuilder {
    fn new(scheme: &TableScheme) -> Self {
        let columns = scheme
            .columns()
            .iter()
            .map(|c| match c.column_type {
                ColumnType::UInt64 => ColumnBuilder::UInt64(UInt64Builder::new()),
                ColumnType::String => ColumnBuilder::String(StringBuilder::new()),
            })
            .collect();
        Self {
            schema: scheme.arrow_schema(),
            columns,
            rows: 0,
        }
    }

    fn len(&self) -> usize {
        self.rows
    }

    fn is_empty(&self) -> bool {
        self.rows == 0
    }

    fn append_row(&mut self, row: &Row<'_>) -> StoreResult<()> {
        for (idx, column) in self.columns.iter_mut().enumerate() {
            match column {
                ColumnBuilder::UInt64(builder) => {
                    let value: i64 = row.get(idx)?;
                    let value = u64::try_from(value).map_err(|_| {
                        StoreError::OutOfRange(format!("negative value {} in column {}", value, idx))
                    })?;
                    builder.append_value(value);
                }
                ColumnBuilder::String(builder) => {
                    let value: String = row.get(idx)?;
                    builder.append_value(value);
                }
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Emit the buffered rows as one block and start over
    fn finish(&mut self) -> StoreResult<RecordBatch> {
        let arrays = self
            .columns
            .iter_mut()
            .map(|column| match column {
                ColumnBuilder::UInt64(builder) => Arc::new(builder.finish()) as ArrayRef,
                ColumnBuilder::String(builder) => Arc::new(builder.finish()) as ArrayRef,
            })
            .collect::<Vec<_>>();
        self.rows = 0;
        Ok(RecordBatch::try_new(self.schema.clone(), arrays)?)
    }
}

/// Typed view over one column of an inserted block
enum ColumnValues<'a> {
    UInt64(&'a UInt64Array),
    Utf8(&'a StringArray),
}

impl<'a> ColumnValues<'a> {
    fn from_array(name: &str, array: &'a ArrayRef) -> StoreResult<Self> {
        if let Some(values) = array.as_any().downcast_ref::<UInt64Array>() {
            return Ok(ColumnValues::UInt64(values));
        }
        if let Some(values) = array.as_any().downcast_ref::<StringArray>() {
            return Ok(ColumnValues::Utf8(values));
        }
        Err(StoreError::UnsupportedColumn {
            name: name.to_string(),
            data_type: array.data_type().to_string(),
        })
    }

    fn value_at(&self, row: usize) -> StoreResult<Value> {
        match self {
            ColumnValues::UInt64(values) if values.is_null(row) => Ok(Value::Null),
            ColumnValues::Utf8(values) if values.is_null(row) => Ok(Value::Null),
            ColumnValues::UInt64(values) => {
                let value = values.value(row);
                let value = i64::try_from(value).map_err(|_| {
                    StoreError::OutOfRange(format!("{} does not fit a SQLite INTEGER", value))
                })?;
                Ok(Value::Integer(value))
            }
            ColumnValues::Utf8(values) => Ok(Value::Text(values.value(row).to_string())),
        }
    }
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::UInt64 => "INTEGER",
        ColumnType::String => "TEXT",
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn qualified(table: &TableRef) -> String {
    format!("{}.{}", quote(&table.database), quote(&table.table))
}
