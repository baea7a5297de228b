// src/error.rs

//! Unified error handling for the register book scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Empty or blank required argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    /// Run deadline reached while a request was in flight
    #[error("Deadline exceeded while searching '{variation}'")]
    DeadlineExceeded { variation: String },

    /// Remote search refused an over-broad query
    #[error("Too many results for search string '{variation}'")]
    CapacityExceeded { variation: String },

    /// Result table markup does not match the expected layout
    #[error("Parse error at row {row}: {message}")]
    Parse { row: usize, message: String },

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet writer failed
    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

/// Coarse error classes reported in the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    InvalidInput,
    Network,
    CapacityExceeded,
    Parse,
    Configuration,
    Io,
}

impl AppError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a parse error for the given result row.
    pub fn parse(row: usize, message: impl fmt::Display) -> Self {
        Self::Parse {
            row,
            message: message.to_string(),
        }
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Classify the error for summary accounting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Network(_) | Self::DeadlineExceeded { .. } => ErrorKind::Network,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Selector { .. } | Self::Config(_) | Self::Toml(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Json(_) | Self::Export(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidInput => "invalid_input",
            Self::Network => "network",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::Parse => "parse",
            Self::Configuration => "configuration",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(AppError::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(AppError::parse(3, "missing cell").kind(), ErrorKind::Parse);
        assert_eq!(AppError::config("workers").kind(), ErrorKind::Configuration);
        assert_eq!(
            AppError::DeadlineExceeded {
                variation: "AB".into()
            }
            .kind(),
            ErrorKind::Network
        );
    }

    #[test]
    fn test_parse_error_message_has_row() {
        let err = AppError::parse(7, "no <img> in flag cell");
        assert_eq!(err.to_string(), "Parse error at row 7: no <img> in flag cell");
    }
}
