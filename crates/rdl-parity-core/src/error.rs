//! Error types for harness sessions
//!
//! Only environment problems surface as [`ParityError`]. Anything that goes
//! wrong while a single tool processes a single input is folded into a
//! [`RunResult`](crate::runner::RunResult) instead.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for harness operations
#[derive(Debug, Error)]
pub enum ParityError {
    /// The corpus directory does not exist
    #[error("Test directory does not exist: {}", path.display())]
    TestDirMissing { path: PathBuf },

    /// The corpus directory exists but nothing matched the input pattern
    #[error("No files matching '{pattern}' found in directory {}", dir.display())]
    NoInputFiles { dir: PathBuf, pattern: String },

    /// A tool executable could not be located
    #[error("{tool} executable not found: {}", path.display())]
    ExecutableNotFound { tool: String, path: PathBuf },

    /// A tool's script argument could not be located
    #[error("{tool} script not found: {}", path.display())]
    ScriptNotFound { tool: String, path: PathBuf },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{}': {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A user-supplied regular expression failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Report serialization or persistence errors
    #[error("Report error: {message}")]
    ReportError { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Environment,
    Config,
    Io,
    Pattern,
    Report,
}

impl ParityError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParityError::TestDirMissing { .. }
            | ParityError::NoInputFiles { .. }
            | ParityError::ExecutableNotFound { .. }
            | ParityError::ScriptNotFound { .. } => ErrorKind::Environment,
            ParityError::ConfigError { .. } => ErrorKind::Config,
            ParityError::IoError { .. } => ErrorKind::Io,
            ParityError::InvalidPattern { .. } => ErrorKind::Pattern,
            ParityError::ReportError { .. } => ErrorKind::Report,
        }
    }

    /// Missing corpus or missing tools; these abort a session before any case runs
    pub fn is_environment_error(&self) -> bool {
        self.kind() == ErrorKind::Environment
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a report error
    pub fn report_error(message: impl Into<String>) -> Self {
        Self::ReportError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ParityError {
    fn from(err: serde_json::Error) -> Self {
        Self::report_error(err.to_string())
    }
}
