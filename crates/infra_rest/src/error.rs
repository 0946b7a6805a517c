//! REST adapter error types
//!
//! Configuration failures are reported as `ConfigError`. Request failures are
//! translated onto `PortError` so callers of the `QueryClient` port see the
//! same taxonomy as with any other adapter:
//!
//! - 401/403 -> `PortError::Unauthorized`
//! - 404 -> `PortError::NotFound`
//! - 409 -> `PortError::Conflict`
//! - 429 -> `PortError::RateLimited`
//! - 5xx -> `PortError::ServiceUnavailable`
//! - Timeouts -> `PortError::Timeout`
//! - Connect failures -> `PortError::Connection`
//! - Undecodable bodies -> `PortError::Transformation`
//! - Other -> `PortError::Internal`

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur while configuring the REST adapter
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing configuration: {0} is required")]
    Missing(&'static str),

    /// A variable is set to an unusable value
    #[error("Invalid configuration for {variable}: {message}")]
    Invalid {
        variable: &'static str,
        message: String,
    },

    /// The configuration sources could not be read
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),

    /// The HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Translates a non-success response into a `PortError`
///
/// # Arguments
///
/// * `operation` - Description of the request, e.g. "select body_measurements"
/// * `status` - The response status
/// * `retry_after_secs` - Parsed `Retry-After` header, if any
/// * `body` - Response body, usually a PostgREST error document
pub fn status_error(
    operation: &str,
    status: StatusCode,
    retry_after_secs: Option<u64>,
    body: String,
) -> PortError {
    let message = if body.is_empty() {
        format!("{} returned {}", operation, status)
    } else {
        format!("{} returned {}: {}", operation, status, body)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized { message },
        StatusCode::NOT_FOUND => PortError::not_found("table", operation),
        StatusCode::CONFLICT => PortError::conflict(message),
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited { retry_after_secs },
        s if s.is_server_error() => PortError::ServiceUnavailable { service: message },
        _ => PortError::internal(message),
    }
}

/// Translates a transport-level failure into a `PortError`
pub fn transport_error(operation: &str, timeout: Duration, error: reqwest::Error) -> PortError {
    if error.is_timeout() {
        PortError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout.as_millis() as u64,
        }
    } else if error.is_connect() {
        PortError::Connection {
            message: format!("{} could not connect: {}", operation, error),
            source: Some(Box::new(error)),
        }
    } else if error.is_decode() {
        PortError::transformation(format!("{}: {}", operation, error))
    } else {
        PortError::Internal {
            message: format!("{} failed: {}", operation, error),
            source: Some(Box::new(error)),
        }
    }
}
