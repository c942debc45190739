//! Table Filler - Creates a database and table and fills it from files
//!
//! The filler owns no connection: it borrows the store client it is given
//! and issues setup DDL and ingestion calls through it.

use crate::config::FillerConfig;
use crate::error::{FillerError, Result};
use crate::ingestion::{IngestionOptions, IngestionOrchestrator, IngestionResult};
use crate::schema::{validate_identifier, TableRef, TableScheme};
use crate::store::{Ddl, StoreClient};
use std::path::Path;
use tracing::info;

pub struct TableFiller<'a> {
    client: &'a dyn StoreClient,
    database: String,
    table_name: String,
    scheme: TableScheme,
    options: IngestionOptions,
}

impl<'a> TableFiller<'a> {
    /// Create the database if it does not exist yet.
    ///
    /// No table is selected; call [`TableFiller::create_table`] before `add`.
    pub fn new(client: &'a dyn StoreClient, database: impl Into<String>) -> Result<Self> {
        let filler = Self {
            client,
            database: database.into(),
            table_name: String::new(),
            scheme: TableScheme::new(Vec::new()),
            options: IngestionOptions::default(),
        };
        filler.create_db()?;
        Ok(filler)
    }

    /// Create the configured database and table, then ingest the configured
    /// data file, if any
    pub fn open(client: &'a dyn StoreClient, config: &FillerConfig) -> Result<Self> {
        config.validate()?;

        let mut filler = Self::new(client, config.database.clone())?
            .with_table(config.table.clone(), config.scheme.clone())
            .with_options(config.ingestion.clone());

        if filler.table_name.is_empty() || filler.scheme.is_empty() {
            return Ok(filler);
        }
        filler.create_table(None, None)?;

        if let Some(data_file) = &config.data_file {
            let result = filler.add(data_file)?;
            info!(
                "Initial load of {}: pushed {}, duplicated {}",
                result.table, result.accepted, result.duplicates
            );
        }
        Ok(filler)
    }

    /// Select a table and scheme without creating anything
    pub fn with_table(mut self, table_name: impl Into<String>, scheme: TableScheme) -> Self {
        self.table_name = table_name.into();
        self.scheme = scheme;
        self
    }

    pub fn with_options(mut self, options: IngestionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.database, &self.table_name)
    }

    pub fn scheme(&self) -> &TableScheme {
        &self.scheme
    }

    pub fn options(&self) -> &IngestionOptions {
        &self.options
    }

    fn create_db(&self) -> Result<()> {
        validate_identifier(&self.database)?;
        self.client
            .execute(&Ddl::CreateDatabase(&self.database))
            .map_err(|e| FillerError::Schema(e.to_string()))?;
        info!("Database {} ready", self.database);
        Ok(())
    }

    /// Create the table if it does not exist.
    ///
    /// A given name or scheme replaces the filler's current one once the
    /// table has been created; a rejected call leaves the filler unchanged.
    pub fn create_table(
        &mut self,
        table_name: Option<&str>,
        scheme: Option<TableScheme>,
    ) -> Result<()> {
        let table_name = table_name
            .filter(|n| !n.is_empty())
            .unwrap_or(self.table_name.as_str())
            .to_string();
        let scheme = scheme
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.scheme.clone());

        let table = check_target(&self.database, &table_name, &scheme)?;
        self.client
            .execute(&Ddl::CreateTable {
                table: &table,
                scheme: &scheme,
            })
            .map_err(|e| FillerError::Schema(e.to_string()))?;

        info!("Table {} {} ready", table, scheme.creation_scheme());
        self.table_name = table_name;
        self.scheme = scheme;
        Ok(())
    }

    /// Drop the current table; absent tables and unset names are a no-op
    pub fn drop_table(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Ok(());
        }

        let table = self.table_ref();
        table.validate()?;
        self.client
            .execute(&Ddl::DropTable(&table))
            .map_err(|e| FillerError::Schema(e.to_string()))?;

        info!("Dropped table {} (if it existed)", table);
        Ok(())
    }

    /// Ingest `data_file` into the current table.
    ///
    /// Returns the number of pushed and duplicated records. Takes `&mut self`
    /// so a filler never runs two ingestion calls at once.
    pub fn add(&mut self, data_file: impl AsRef<Path>) -> Result<IngestionResult> {
        let table = self.target()?;
        IngestionOrchestrator::new(self.client, &table, &self.scheme, &self.options)
            .add(data_file.as_ref())
    }

    /// Current table, checked to be usable by the ingestion pipeline
    fn target(&self) -> Result<TableRef> {
        check_target(&self.database, &self.table_name, &self.scheme)
    }
}

fn check_target(database: &str, table_name: &str, scheme: &TableScheme) -> Result<TableRef> {
    if table_name.is_empty() {
        return Err(FillerError::Schema("no table selected".to_string()));
    }
    let table = TableRef::new(database, table_name);
    table.validate()?;
    scheme.validate()?;
    Ok(table)
}
