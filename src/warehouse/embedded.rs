//! Embedded DuckDB warehouse
//!
//! One database file per project. A table's dataset becomes a DuckDB schema.
//! Rows are staged as newline-delimited JSON and appended with `read_json`
//! using the declared column map, so unknown keys are dropped, missing keys
//! become NULL and a value of the wrong type rejects the whole file.

use super::schema::{quote_ident, quote_literal, TableSchema};
use super::types::{LoadJob, TableRef, Warehouse};
use crate::error::{Error, Result, ResultExt};
use crate::types::Record;
use async_trait::async_trait;
use duckdb::Connection;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// DuckDB-backed warehouse
pub struct DuckDbWarehouse {
    /// DuckDB connection
    conn: Mutex<Connection>,
    /// Project this database holds
    project: String,
    /// Database file, `None` when in memory
    path: Option<PathBuf>,
}

impl std::fmt::Debug for DuckDbWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbWarehouse")
            .field("project", &self.project)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl DuckDbWarehouse {
    /// Open `<dir>/<project>.duckdb`, creating the directory if needed
    pub fn open_for_project(dir: impl AsRef<Path>, project: &str) -> Result<Self> {
        if project.is_empty() {
            return Err(Error::missing_field("warehouse.project"));
        }
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::config(format!(
                "Failed to create warehouse directory {}: {e}",
                dir.display()
            ))
        })?;

        let path = dir.join(format!("{project}.duckdb"));
        let conn = Connection::open(&path).map_err(|e| {
            Error::config(format!("Failed to open warehouse {}: {e}", path.display()))
        })?;
        prepare_connection(&conn)?;
        info!("Opened warehouse {} for project {project}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            project: project.to_string(),
            path: Some(path),
        })
    }

    /// In-memory warehouse
    pub fn in_memory(project: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        prepare_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            project: project.to_string(),
            path: None,
        })
    }

    /// Project this warehouse holds
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Database file path, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Other("Warehouse connection lock poisoned".to_string()))
    }

    /// Reject tables that name another project
    fn check_project(&self, table: &TableRef) -> Result<()> {
        match &table.project {
            Some(project) if *project != self.project => Err(Error::invalid_table(
                table.to_string(),
                format!("warehouse holds project '{}'", self.project),
            )),
            _ => Ok(()),
        }
    }

    /// Create the schema and table if they do not exist
    pub fn ensure_table(&self, table: &TableRef, schema: &TableSchema) -> Result<()> {
        self.check_project(table)?;
        let sql = format!(
            "CREATE SCHEMA IF NOT EXISTS {}; CREATE TABLE IF NOT EXISTS {} ({});",
            quote_ident(&table.dataset),
            table.qualified(),
            schema.column_definitions()
        );
        self.lock()?.execute_batch(&sql)?;
        Ok(())
    }

    /// Number of rows in a table
    pub fn row_count(&self, table: &TableRef) -> Result<u64> {
        self.check_project(table)?;
        let sql = format!("SELECT count(*) FROM {}", table.qualified());
        let count: i64 = self.lock()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Values of one column or expression cast to text, sorted
    pub fn column_as_strings(&self, table: &TableRef, expr: &str) -> Result<Vec<Option<String>>> {
        self.check_project(table)?;
        let sql = format!(
            "SELECT CAST({expr} AS VARCHAR) AS v FROM {} ORDER BY v NULLS LAST",
            table.qualified()
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, Option<String>>(0))?;
        let values = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Stage rows and append them in one transaction
    fn append(&self, table: &TableRef, schema: &TableSchema, rows: &[Record]) -> Result<u64> {
        let mut staged = tempfile::Builder::new()
            .prefix("load-")
            .suffix(".json")
            .tempfile()
            .context("Failed to create staging file")?;
        for row in rows {
            serde_json::to_writer(&mut staged, row)?;
            staged.write_all(b"\n")?;
        }
        staged.flush()?;

        let staged_path = staged.path().to_string_lossy().to_string();
        let sql = format!(
            "INSERT INTO {} BY NAME SELECT * FROM read_json({}, format = 'newline_delimited', columns = {})",
            table.qualified(),
            quote_literal(&staged_path),
            schema.json_columns()
        );
        debug!("Load SQL: {sql}");

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let inserted = tx.execute(&sql, [])?;
        tx.commit()?;
        Ok(inserted as u64)
    }
}

/// Load the compiled-in JSON reader and never fetch extensions at load time
fn prepare_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "SET autoinstall_known_extensions = false; SET autoload_known_extensions = false; LOAD json;",
    )
    .map_err(|e| Error::config(format!("DuckDB JSON reader unavailable: {e}")))
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    async fn load(
        &self,
        table: &TableRef,
        schema: &TableSchema,
        rows: &[Record],
        source_file: &str,
    ) -> Result<LoadJob> {
        self.ensure_table(table, schema)?;

        let mut job = LoadJob::new(table.clone(), source_file);
        job.start()?;
        debug!("Load job {} started for {source_file}", job.id);

        match self.append(table, schema, rows) {
            Ok(inserted) => job.succeed(inserted)?,
            Err(e) => job.fail(vec![e.to_string()])?,
        }
        Ok(job)
    }
}
