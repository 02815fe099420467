// src/error.rs

//! Unified error handling for the fetcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for fetcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Login failed or a call needed a session that is missing
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The XRPC endpoint answered with an error status
    #[error("API error in {method} (status {status}): {message}")]
    Api {
        method: String,
        status: u16,
        message: String,
    },

    /// A handle, DID or locator could not be understood or resolved
    #[error("Identifier error for '{input}': {message}")]
    Identifier { input: String, message: String },

    /// Every list address variant was rejected
    #[error("List resolution failed, attempted: {}", attempted.join(", "))]
    ListResolution { attempted: Vec<String> },

    /// Writing or reading exported results failed
    #[error("Export error: {0}")]
    Export(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an API error for an XRPC method.
    pub fn api(method: impl Into<String>, status: u16, message: impl fmt::Display) -> Self {
        Self::Api {
            method: method.into(),
            status,
            message: message.to_string(),
        }
    }

    /// Create an identifier error with the offending input.
    pub fn identifier(input: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Identifier {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Create an export error.
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_resolution_message_lists_addresses() {
        let err = AppError::ListResolution {
            attempted: vec!["at://a/b/c".to_string(), "a/b/c".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "List resolution failed, attempted: at://a/b/c, a/b/c"
        );
    }
}
