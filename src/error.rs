// src/error.rs

//! Error types for quickpack

use thiserror::Error;

/// Errors that can occur during build, install, and uninstall stages
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid deployment descriptor
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Malformed glob pattern
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    GlobError { pattern: String, reason: String },

    /// File placement failure
    #[error("Copy failed: {0}")]
    CopyError(String),

    /// Operator script exited non-zero or could not be run
    #[error("Script error: {0}")]
    ScriptError(String),

    /// systemctl subcommand failure
    #[error("Service manager error: {0}")]
    ServiceError(String),

    /// Bounded wait expired
    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    /// A matched path fell outside its base directory
    #[error("Path '{0}' is not relative to '{1}'")]
    RelativePath(String, String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Descriptor parse error
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Result type for quickpack operations
pub type Result<T> = std::result::Result<T, Error>;
