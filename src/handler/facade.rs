//! The database handler
//!
//! `DbHandler` owns at most one DuckDB connection. The connection exists only
//! between `connect` and `close`; every other operation fails with a state
//! error outside that window.

use super::sql::{self, CreateMode};
use crate::config::ConnectionParams;
use crate::error::{Error, Result};
use crate::frame;
use crate::result::{QueryOutcome, ResultSet};
use crate::types::{ColumnType, Row, Value};
use arrow::record_batch::RecordBatch;
use duckdb::{params_from_iter, Connection};
use std::path::{Path, PathBuf};

/// Scratch table used while rewriting a table with its distinct rows
const DEDUP_TABLE: &str = "__dbhandler_dedup";

/// Lifecycle of the underlying connection
enum HandleState {
    Idle,
    Open(Connection),
    Closed,
}

/// Handler wrapping a single database connection
pub struct DbHandler {
    /// Parameters the connection is opened with
    params: ConnectionParams,
    /// Absolute database file path (`None` for in-memory)
    db_file_path: Option<PathBuf>,
    state: HandleState,
}

impl std::fmt::Debug for DbHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandler")
            .field("location", &self.location())
            .field("connected", &self.is_connected())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl DbHandler {
    /// Create an unconnected handler
    ///
    /// The database path is resolved to an absolute path here, so later
    /// changes of the working directory do not move the database.
    pub fn new(params: ConnectionParams) -> Result<Self> {
        params.validate()?;

        let db_file_path = params
            .path
            .as_deref()
            .map(std::path::absolute)
            .transpose()?;

        Ok(Self {
            params,
            db_file_path,
            state: HandleState::Idle,
        })
    }

    /// Create a handler and connect it
    pub fn open(params: ConnectionParams) -> Result<Self> {
        let mut handler = Self::new(params)?;
        handler.connect()?;
        Ok(handler)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open the connection
    pub fn connect(&mut self) -> Result<()> {
        match self.state {
            HandleState::Open(_) => return Err(Error::state("handler is already connected")),
            HandleState::Closed => return Err(Error::state("handle is closed")),
            HandleState::Idle => {}
        }

        let config = self.params.to_duckdb_config()?;
        let conn = match &self.db_file_path {
            Some(path) => Connection::open_with_flags(path, config),
            None => Connection::open_in_memory_with_flags(config),
        }
        .map_err(|e| Error::connection(format!("Failed to open {}: {e}", self.location())))?;

        tracing::info!("Connected to {}", self.location());
        self.state = HandleState::Open(conn);
        Ok(())
    }

    /// Release the connection
    ///
    /// Closing twice, or closing a handler that never connected, is a no-op.
    /// The handler cannot be reconnected afterwards.
    pub fn close(&mut self) -> Result<()> {
        let HandleState::Open(conn) = std::mem::replace(&mut self.state, HandleState::Closed)
        else {
            return Ok(());
        };

        if let Err((_conn, e)) = conn.close() {
            tracing::warn!("Error while closing {}: {e}", self.location());
            return Err(Error::connection(format!(
                "Failed to close {}: {e}",
                self.location()
            )));
        }

        tracing::info!("Closed connection to {}", self.location());
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, HandleState::Open(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, HandleState::Closed)
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Absolute path of the database file, `None` for in-memory databases
    pub fn db_file_path(&self) -> Option<&Path> {
        self.db_file_path.as_deref()
    }

    fn location(&self) -> String {
        self.db_file_path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }

    fn conn(&self) -> Result<&Connection> {
        match &self.state {
            HandleState::Open(conn) => Ok(conn),
            HandleState::Idle => Err(Error::state("handler is not connected")),
            HandleState::Closed => Err(Error::state("handle is closed")),
        }
    }

    fn conn_mut(&mut self) -> Result<&mut Connection> {
        match &mut self.state {
            HandleState::Open(conn) => Ok(conn),
            HandleState::Idle => Err(Error::state("handler is not connected")),
            HandleState::Closed => Err(Error::state("handle is closed")),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run one statement with positional `?` parameters
    ///
    /// Statements that produce rows (`SELECT`, `WITH`, `VALUES`, `DESCRIBE`,
    /// ...) return [`QueryOutcome::Rows`]; everything else returns the number
    /// of changed rows.
    pub fn execute(&mut self, query: &str, params: &[Value]) -> Result<QueryOutcome> {
        let conn = self.conn()?;

        if sql::is_read_statement(query) {
            let frame = query_frame(conn, query, params)?;
            return Ok(QueryOutcome::Rows(ResultSet::from_frame(&frame)?));
        }

        tracing::debug!("Executing statement: {}", query);
        let mut stmt = conn
            .prepare(query)
            .map_err(|e| Error::query(format!("Failed to prepare statement: {e}")))?;
        let affected = stmt
            .execute(params_from_iter(params))
            .map_err(|e| Error::query(format!("Failed to execute statement: {e}")))?;

        Ok(QueryOutcome::Affected(affected))
    }

    /// Run a query and return its rows
    pub fn exec_query(&self, query: &str) -> Result<ResultSet> {
        ResultSet::from_frame(&self.exec_query_to_frame(query)?)
    }

    /// Run a query and return its rows as one Arrow frame
    pub fn exec_query_to_frame(&self, query: &str) -> Result<RecordBatch> {
        query_frame(self.conn()?, query, &[])
    }

    /// Names of the base tables in the current schema, sorted
    pub fn tables(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT table_name
                 FROM information_schema.tables
                 WHERE table_catalog = current_database()
                   AND table_schema = current_schema()
                   AND table_type = 'BASE TABLE'
                 ORDER BY table_name",
            )
            .map_err(|e| Error::query(format!("Failed to prepare query: {e}")))?;

        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::query(format!("Failed to query tables: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::query(format!("Failed to read table name: {e}")))?;

        Ok(tables)
    }

    fn ensure_table(&self, table: &str) -> Result<()> {
        if self.tables()?.iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(Error::table_not_found(table))
        }
    }

    /// All rows of a table
    pub fn fetchall(&self, table: &str) -> Result<ResultSet> {
        self.ensure_table(table)?;
        self.exec_query(&sql::select_all(table))
    }

    /// All rows of a table as one Arrow frame
    pub fn fetchall_to_frame(&self, table: &str) -> Result<RecordBatch> {
        self.ensure_table(table)?;
        self.exec_query_to_frame(&sql::select_all(table))
    }

    // ========================================================================
    // Table management
    // ========================================================================

    /// Create a table unless it already exists
    pub fn create_table(&mut self, table: &str, columns: &[(&str, ColumnType)]) -> Result<()> {
        self.conn()?;
        if columns.is_empty() {
            return Err(Error::invalid_input(format!(
                "table '{table}' needs at least one column"
            )));
        }

        let query = sql::create_table(
            table,
            columns.iter().map(|(name, ty)| (*name, ty.sql_type())),
            CreateMode::IfNotExists,
        );
        self.run_batch(&query)
    }

    /// Create or replace a table holding the frame's rows
    ///
    /// Column names and types come from the frame's schema.
    pub fn create_table_from_frame(&mut self, table: &str, frame: &RecordBatch) -> Result<()> {
        self.conn()?;
        let schema = frame.schema();
        if schema.fields().is_empty() {
            return Err(Error::empty_input("frame has no columns"));
        }

        let columns = schema
            .fields()
            .iter()
            .map(|f| Ok((f.name().as_str(), frame::sql_type(f.data_type())?)))
            .collect::<Result<Vec<_>>>()?;
        let create = sql::create_table(
            table,
            columns.iter().map(|(name, ty)| (*name, ty.as_str())),
            CreateMode::Replace,
        );

        let conn = self.conn_mut()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::query(format!("Failed to begin transaction: {e}")))?;

        tracing::debug!("Executing statement: {}", create);
        tx.execute_batch(&create)
            .map_err(|e| Error::query(format!("Failed to create table '{table}': {e}")))?;
        insert_frame(&tx, table, frame)?;

        tx.commit()
            .map_err(|e| Error::query(format!("Failed to commit: {e}")))
    }

    /// Rename a table
    pub fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        self.ensure_table(from)?;
        let query = format!(
            "ALTER TABLE {} RENAME TO {}",
            sql::quote_ident(from),
            sql::quote_ident(to)
        );
        self.run_batch(&query)
    }

    /// Drop a table
    pub fn delete_table(&mut self, table: &str) -> Result<()> {
        self.ensure_table(table)?;
        self.run_batch(&format!("DROP TABLE IF EXISTS {}", sql::quote_ident(table)))
    }

    /// Rewrite a table so that it holds only distinct rows
    ///
    /// Column types and constraints are kept. A table without duplicates is
    /// left untouched.
    pub fn delete_duplicated(&mut self, table: &str) -> Result<()> {
        self.ensure_table(table)?;

        let quoted = sql::quote_ident(table);
        let count_sql = format!(
            "SELECT (SELECT COUNT(*) FROM {quoted}),
                    (SELECT COUNT(*) FROM (SELECT DISTINCT * FROM {quoted}))"
        );
        let (total, distinct): (i64, i64) = self
            .conn()?
            .query_row(&count_sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(|e| Error::query(format!("Failed to count rows of '{table}': {e}")))?;

        if total == distinct {
            tracing::debug!("Table '{}' has no duplicate rows", table);
            return Ok(());
        }

        let scratch = sql::quote_ident(DEDUP_TABLE);
        let rewrite = format!(
            "CREATE TEMP TABLE {scratch} AS SELECT DISTINCT * FROM {quoted};
             DELETE FROM {quoted};
             INSERT INTO {quoted} SELECT * FROM {scratch};
             DROP TABLE {scratch};"
        );

        let conn = self.conn_mut()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::query(format!("Failed to begin transaction: {e}")))?;
        tx.execute_batch(&rewrite)
            .map_err(|e| Error::query(format!("Failed to deduplicate '{table}': {e}")))?;
        tx.commit()
            .map_err(|e| Error::query(format!("Failed to commit: {e}")))?;

        tracing::info!(
            "Removed {} duplicate rows from '{}'",
            total - distinct,
            table
        );
        Ok(())
    }

    // ========================================================================
    // Inserts
    // ========================================================================

    /// Insert rows positionally, in one transaction
    pub fn insert_records(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        self.ensure_table(table)?;

        let Some(first) = rows.first() else {
            return Err(Error::empty_input("no records to insert"));
        };
        let width = first.len();
        if width == 0 {
            return Err(Error::empty_input("records have no values"));
        }
        if let Some(pos) = rows.iter().position(|r| r.len() != width) {
            return Err(Error::invalid_input(format!(
                "record {pos} has {} values, expected {width}",
                rows[pos].len()
            )));
        }

        let query = sql::insert_positional(table, width);
        let conn = self.conn_mut()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::query(format!("Failed to begin transaction: {e}")))?;
        {
            tracing::debug!("Executing statement: {} ({} rows)", query, rows.len());
            let mut stmt = tx
                .prepare(&query)
                .map_err(|e| Error::query(format!("Failed to prepare insert: {e}")))?;
            for row in rows {
                stmt.execute(params_from_iter(row))
                    .map_err(|e| Error::query(format!("Failed to insert into '{table}': {e}")))?;
            }
        }
        tx.commit()
            .map_err(|e| Error::query(format!("Failed to commit: {e}")))
    }

    /// Append the frame's rows, matching columns by name
    pub fn insert_records_from_frame(&mut self, table: &str, frame: &RecordBatch) -> Result<()> {
        self.ensure_table(table)?;

        if frame.num_columns() == 0 || frame.num_rows() == 0 {
            return Err(Error::empty_input("frame has no rows to insert"));
        }

        let conn = self.conn_mut()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::query(format!("Failed to begin transaction: {e}")))?;
        insert_frame(&tx, table, frame)?;
        tx.commit()
            .map_err(|e| Error::query(format!("Failed to commit: {e}")))
    }

    fn run_batch(&mut self, query: &str) -> Result<()> {
        tracing::debug!("Executing statement: {}", query);
        self.conn()?
            .execute_batch(query)
            .map_err(|e| Error::query(format!("{e}")))
    }
}

impl Drop for DbHandler {
    fn drop(&mut self) {
        if let HandleState::Open(conn) = std::mem::replace(&mut self.state, HandleState::Closed) {
            if let Err((_conn, e)) = conn.close() {
                tracing::warn!("Error while closing {}: {e}", self.location());
            }
        }
    }
}

/// Run a query and collect DuckDB's Arrow batches into one frame
fn query_frame(conn: &Connection, query: &str, params: &[Value]) -> Result<RecordBatch> {
    tracing::debug!("Executing query: {}", query);

    let mut stmt = conn
        .prepare(query)
        .map_err(|e| Error::query(format!("Failed to prepare query: {e}")))?;
    let batches = stmt
        .query_arrow(params_from_iter(params))
        .map_err(|e| Error::query(format!("Failed to execute query: {e}")))?;

    let schema = batches.get_schema();
    let batches: Vec<RecordBatch> = batches.collect();
    frame::concat_frames(&schema, &batches)
}

/// Insert every row of a frame into the named columns of `table`
fn insert_frame(conn: &Connection, table: &str, frame: &RecordBatch) -> Result<()> {
    if frame.num_rows() == 0 {
        return Ok(());
    }

    let query = sql::insert_named(table, &frame::column_names(frame));
    tracing::debug!("Executing statement: {} ({} rows)", query, frame.num_rows());

    let mut stmt = conn
        .prepare(&query)
        .map_err(|e| Error::query(format!("Failed to prepare insert: {e}")))?;
    for row in frame::frame_rows(frame)? {
        stmt.execute(params_from_iter(&row))
            .map_err(|e| Error::query(format!("Failed to insert into '{table}': {e}")))?;
    }
    Ok(())
}
