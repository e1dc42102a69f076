//! Connection parameters
//!
//! `ConnectionParams` is built in code or loaded from YAML/JSON, and is fixed
//! for the lifetime of a handler.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default database file, relative to the working directory
pub const DEFAULT_DB_FILE: &str = ".db";

/// How the database file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Let DuckDB decide (read-write for local files)
    #[default]
    Automatic,
    ReadOnly,
    ReadWrite,
}

impl From<AccessMode> for duckdb::AccessMode {
    fn from(mode: AccessMode) -> Self {
        match mode {
            AccessMode::Automatic => duckdb::AccessMode::Automatic,
            AccessMode::ReadOnly => duckdb::AccessMode::ReadOnly,
            AccessMode::ReadWrite => duckdb::AccessMode::ReadWrite,
        }
    }
}

/// Parameters used to open the handler's connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Database file; `None` opens an in-memory database
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// File access mode
    #[serde(default)]
    pub access_mode: AccessMode,

    /// DuckDB worker threads (DuckDB's own default when unset)
    #[serde(default)]
    pub threads: Option<u32>,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self::new(DEFAULT_DB_FILE)
    }
}

impl ConnectionParams {
    /// Parameters for a database file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            access_mode: AccessMode::default(),
            threads: None,
        }
    }

    /// Parameters for a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            path: None,
            access_mode: AccessMode::default(),
            threads: None,
        }
    }

    /// Set the access mode
    #[must_use]
    pub fn with_access_mode(mut self, access_mode: AccessMode) -> Self {
        self.access_mode = access_mode;
        self
    }

    /// Set the worker thread count
    #[must_use]
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Check if these parameters describe an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }

    /// Parse parameters from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let params: Self = serde_yaml::from_str(yaml)?;
        params.validate()?;
        Ok(params)
    }

    /// Parse parameters from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Load parameters from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            _ => Err(Error::config(format!(
                "Unsupported config file extension: {}",
                path.display()
            ))),
        }
    }

    /// Check field values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(Error::config("threads must be at least 1"));
        }
        if let Some(path) = &self.path {
            if path.as_os_str().is_empty() {
                return Err(Error::config("path must not be empty"));
            }
        }
        if self.is_in_memory() && self.access_mode == AccessMode::ReadOnly {
            return Err(Error::config("an in-memory database cannot be read-only"));
        }
        Ok(())
    }

    /// Build the DuckDB configuration for these parameters
    pub(crate) fn to_duckdb_config(&self) -> Result<duckdb::Config> {
        let mut config = duckdb::Config::default()
            .access_mode(self.access_mode.into())
            .map_err(|e| Error::connection(format!("Invalid access mode: {e}")))?;

        if let Some(threads) = self.threads {
            config = config
                .threads(i64::from(threads))
                .map_err(|e| Error::connection(format!("Invalid thread count: {e}")))?;
        }

        Ok(config)
    }
}
