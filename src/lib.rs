//! # dbhandler
//!
//! A thin handler around an embedded DuckDB database that returns query
//! results as rows or as Arrow frames.
//!
//! ## Features
//!
//! - **Explicit lifecycle**: `connect` → `execute` → `close`, with misuse reported as state errors
//! - **Tabular results**: rows of typed values, or a single Arrow `RecordBatch`
//! - **Table helpers**: create, rename, drop, deduplicate, fetch and insert
//! - **Frame round trips**: create or append tables straight from Arrow frames
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dbhandler::{ConnectionParams, DbHandler, Result, Value};
//!
//! fn main() -> Result<()> {
//!     let mut handler = DbHandler::open(ConnectionParams::new("app.duckdb"))?;
//!
//!     handler.execute("CREATE TABLE IF NOT EXISTS t (id INTEGER, name VARCHAR)", &[])?;
//!     handler.execute(
//!         "INSERT INTO t VALUES (?, ?)",
//!         &[Value::Integer(1), Value::from("a")],
//!     )?;
//!
//!     let rows = handler.exec_query("SELECT * FROM t")?;
//!     println!("{} rows", rows.row_count());
//!
//!     handler.close()
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Cell values and column types
pub mod types;

/// Connection parameters
pub mod config;

/// Arrow frame conversions
pub mod frame;

/// Row-oriented query results
pub mod result;

/// The database handler
pub mod handler;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{AccessMode, ConnectionParams};
pub use error::{Error, Result};
pub use handler::DbHandler;
pub use result::{QueryOutcome, ResultSet};
pub use types::{ColumnType, Row, Value};

/// Re-exported so callers build frames against the same Arrow version
pub use arrow;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
