//! Error types for directory object lookups.
//!
//! Every failure is terminal for the lookup that produced it. Variants carry the
//! original diagnostic text from the directory or transport layer unchanged.

use serde::Serialize;
use thiserror::Error;

/// Main error type for directory object lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The query specification broke the resolver's input contract
    #[error("Invalid query specification: {0}")]
    InvalidSpecification(String),

    /// Data source input failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No entry matched the search
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one entry matched the search
    #[error("search returned {count} results")]
    Ambiguous {
        /// Number of entries the directory returned
        count: usize,
    },

    /// The directory could not be reached or the session broke down
    #[error("Directory unavailable: {0}")]
    DirectoryUnavailable(String),

    /// The directory answered with an error code or an unexpected response
    #[error("Directory protocol error: {0}")]
    ProtocolError(String),

    /// Connection provider configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No directory session was handed to the data source
    #[error("Unconfigured: {0}")]
    Unconfigured(String),
}

/// Specialized result type for directory object lookups.
pub type Result<T> = std::result::Result<T, Error>;

/// Single reported error for a failed read, as surfaced to the state layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable error code for programmatic handling
    pub code: String,
    /// Short summary of what failed
    pub summary: String,
    /// Full error text, including the directory's own message
    pub detail: String,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidSpecification(_) => "INVALID_SPECIFICATION",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Ambiguous { .. } => "AMBIGUOUS",
            Self::DirectoryUnavailable(_) => "DIRECTORY_UNAVAILABLE",
            Self::ProtocolError(_) => "PROTOCOL_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Unconfigured(_) => "UNCONFIGURED",
        }
    }

    /// Converts the error into a [`Diagnostic`] with the given summary.
    #[must_use]
    pub fn into_diagnostic(self, summary: impl Into<String>) -> Diagnostic {
        Diagnostic {
            code: self.error_code().to_string(),
            summary: summary.into(),
            detail: self.to_string(),
        }
    }

    /// Returns true if this error points at the environment rather than the
    /// caller's query, and should be logged as such.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnavailable(_)
                | Self::ProtocolError(_)
                | Self::ConfigError(_)
                | Self::Unconfigured(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
