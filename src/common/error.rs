//! Error types for the API test runner
//!
//! Only loading and output concerns produce errors. Anything that goes wrong
//! while a suite is executing (transport failures, non-2xx responses, failed
//! logins) is recorded as an outcome instead, so one bad request never stops
//! the rest of the suite.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the API test runner
#[derive(Error, Debug)]
pub enum Error {
    // === Suite Errors ===
    #[error("Failed to read test suite '{path}': {error}")]
    SuiteRead { path: String, error: String },

    #[error("Failed to parse test suite '{path}': {message}")]
    SuiteParse { path: String, message: String },

    #[error("Unsupported suite file '{0}'. Expected a .json, .yaml or .yml file")]
    UnsupportedSuiteFormat(String),

    #[error("No test suites found in '{0}'")]
    NoSuites(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Transport Setup Errors ===
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to write transcript '{path}': {error}")]
    OutputWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a suite read error for a path
    pub fn suite_read(path: &Path, error: impl ToString) -> Self {
        Self::SuiteRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a suite parse error for a path
    pub fn suite_parse(path: &Path, message: impl ToString) -> Self {
        Self::SuiteParse {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create an output write error for a path
    pub fn output_write(path: &Path, error: impl ToString) -> Self {
        Self::OutputWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
