//! Error types for dbhandler
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for dbhandler
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Lifecycle Errors
    // ============================================================================
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Invalid handler state: {message}")]
    State { message: String },

    // ============================================================================
    // Table / Input Errors
    // ============================================================================
    #[error("table '{table}' does not exist yet")]
    TableNotFound { table: String },

    #[error("Empty input: {message}")]
    EmptyInput { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Unsupported column type: {data_type}")]
    UnsupportedType { data_type: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Arrow / I/O Errors
    // ============================================================================
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a table-not-found error
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Create an empty input error
    pub fn empty_input(message: impl Into<String>) -> Self {
        Self::EmptyInput {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an unsupported type error
    pub fn unsupported_type(data_type: impl std::fmt::Display) -> Self {
        Self::UnsupportedType {
            data_type: data_type.to_string(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for connect-time failures
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// True for execution-time failures
    pub fn is_query(&self) -> bool {
        matches!(self, Error::Query { .. })
    }

    /// True when the handler was used outside its open lifecycle
    pub fn is_state(&self) -> bool {
        matches!(self, Error::State { .. })
    }
}

/// Result type alias for dbhandler
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::table_not_found("test");
        assert_eq!(err.to_string(), "table 'test' does not exist yet");

        let err = Error::state("handle is closed");
        assert_eq!(err.to_string(), "Invalid handler state: handle is closed");

        let err = Error::connection("no such directory");
        assert_eq!(err.to_string(), "Connection failed: no such directory");

        let err = Error::unsupported_type("Duration(Second)");
        assert_eq!(err.to_string(), "Unsupported column type: Duration(Second)");
    }

    #[test]
    fn test_error_kinds() {
        assert!(Error::state("closed").is_state());
        assert!(!Error::state("closed").is_query());
        assert!(Error::query("syntax").is_query());
        assert!(Error::connection("refused").is_connection());
        assert!(!Error::table_not_found("t").is_connection());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error:"));
    }
}
