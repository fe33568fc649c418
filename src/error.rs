//! Application error types for cart-sync
//!
//! This module defines common error types used throughout the application.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by calls against the marketing platform API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// Platform answered HTTP 429 for a single attempt
    #[error("Rate limited by platform (HTTP 429)")]
    Throttled,

    /// Every attempt of a call was throttled
    #[error("Maximum attempts reached due to API throttling ({attempts} attempts)")]
    RetriesExhausted {
        /// Number of throttled attempts made
        attempts: u32,
    },

    /// Non-success, non-throttling status
    #[error("API call failed with status code: {status} - {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// Network timeout
    #[error("Network timeout")]
    NetworkTimeout,

    /// Generic network error
    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// Request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors raised while reading input records
#[derive(Debug, Error)]
pub enum SourceError {
    /// IO error while reading the source
    #[error("Source IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Records could not be parsed
    #[error("Failed to parse records: {0}")]
    Parse(String),

    /// File extension is not a supported record format
    #[error("Unsupported record format: {0}")]
    UnsupportedFormat(String),
}

/// Application-level error type
///
/// This is the main error type used throughout the application.
/// It aggregates all domain-specific error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Source error
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// API error
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Trait for determining if an error is retryable
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;
}

impl RetryableError for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Throttled => true,

            // Everything else is terminal for the call
            ApiError::RetriesExhausted { .. } => false,
            ApiError::Status { .. } => false,
            ApiError::NetworkTimeout => false,
            ApiError::Network(_) => false,
            ApiError::InvalidBody(_) => false,
            ApiError::InvalidRequest(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: ApiError messages with parameters
    #[test]
    fn test_api_error_messages() {
        assert_eq!(
            ApiError::Throttled.to_string(),
            "Rate limited by platform (HTTP 429)"
        );
        assert_eq!(
            ApiError::RetriesExhausted { attempts: 10 }.to_string(),
            "Maximum attempts reached due to API throttling (10 attempts)"
        );
        assert_eq!(
            ApiError::Status {
                status: 500,
                body: "boom".to_string()
            }
            .to_string(),
            "API call failed with status code: 500 - boom"
        );
        assert_eq!(ApiError::NetworkTimeout.to_string(), "Network timeout");
    }

    // Test 2: Only throttling is retryable
    #[test]
    fn test_api_error_retryable() {
        assert!(ApiError::Throttled.is_retryable());

        assert!(!ApiError::RetriesExhausted { attempts: 10 }.is_retryable());
        assert!(!ApiError::Status {
            status: 500,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Status {
            status: 404,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::NetworkTimeout.is_retryable());
        assert!(!ApiError::Network("reset".to_string()).is_retryable());
        assert!(!ApiError::InvalidBody("eof".to_string()).is_retryable());
    }

    // Test 3: From trait conversions for AppError
    #[test]
    fn test_app_error_from_api_error() {
        let app_err: AppError = ApiError::NetworkTimeout.into();

        match app_err {
            AppError::Api(ApiError::NetworkTimeout) => (),
            _ => panic!("Expected AppError::Api(ApiError::NetworkTimeout)"),
        }
    }

    // Test 4: SourceError from IO error
    #[test]
    fn test_source_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let source_err: SourceError = io_err.into();

        match source_err {
            SourceError::Io(_) => (),
            _ => panic!("Expected SourceError::Io"),
        }
    }

    // Test 5: AppError display includes source error
    #[test]
    fn test_app_error_display() {
        let app_err = AppError::Config(ConfigError::MissingRequired("api_token".to_string()));
        assert_eq!(
            app_err.to_string(),
            "Configuration error: Missing required configuration: api_token"
        );

        let app_err = AppError::Source(SourceError::UnsupportedFormat("csv".to_string()));
        assert_eq!(
            app_err.to_string(),
            "Source error: Unsupported record format: csv"
        );
    }
}
