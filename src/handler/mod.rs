//! Database handler
//!
//! Wraps a single DuckDB connection and exposes convenience operations that
//! return rows ([`ResultSet`](crate::ResultSet)) or Arrow frames.
//!
//! # Overview
//!
//! - `DbHandler` - connection lifecycle, queries and table management
//! - SQL text builders with identifier quoting

mod facade;
mod sql;

pub use facade::DbHandler;
pub use sql::is_read_statement;
