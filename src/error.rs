//! Error types for the aMember client
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Field-level coercion problems are not errors: they are reported as
//! diagnostics (see [`crate::decode::Diagnostic`]) and never abort a record.

use thiserror::Error;

/// The main error type for the aMember client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // API Errors
    // ============================================================================
    /// The envelope carried `error: true`
    #[error("API error: {message}")]
    Api { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Database Errors
    // ============================================================================
    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Connection check failed: {message}")]
    ConnectionCheck { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a connection check error
    pub fn connection_check(message: impl Into<String>) -> Self {
        Self::ConnectionCheck {
            message: message.into(),
        }
    }

    /// Whether the failure happened below the API (network, HTTP status)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::HttpStatus { .. } | Error::InvalidUrl(_)
        )
    }

    /// Whether the API itself reported the failure in its envelope
    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

/// Result type alias for the aMember client
pub type Result<T> = std::result::Result<T, Error>;

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("api_key");
        assert_eq!(err.to_string(), "Missing required config field: api_key");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::api("Invalid API key");
        assert_eq!(err.to_string(), "API error: Invalid API key");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::http_status(500, "").is_transport());
        assert!(!Error::http_status(500, "").is_api());

        assert!(Error::api("denied").is_api());
        assert!(!Error::api("denied").is_transport());

        assert!(!Error::decode("not an object").is_transport());
        assert!(!Error::config("test").is_api());
    }

    #[test]
    fn test_io_error_display() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: denied");
    }
}
