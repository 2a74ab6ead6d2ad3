//! Error types for the Jira and Tempo gateway.

use thiserror::Error;

/// Errors that can occur when talking to Jira or Tempo.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - invalid email or token.
    #[error("Authentication failed: check your email and API token")]
    Unauthorized,

    /// Permission denied - user lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The request was rejected as invalid (bad transition, malformed estimate...).
    #[error("Request rejected: {0}")]
    BadRequest(String),

    /// Rate limited by the remote service.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Remote server error.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Keyring error when retrieving tokens.
    #[error("Keyring error: {0}")]
    Keyring(String),

    /// The response body could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Conflict error - issue was modified by another user.
    #[error("Conflict: issue was modified by another user. Please refresh and try again")]
    Conflict,
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        match status.as_u16() {
            400 => ApiError::BadRequest(context.to_string()),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            409 => ApiError::Conflict,
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }

    /// Whether the client should retry the request that produced this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::ServerError(_) | ApiError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_error_from_status_400() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "originalEstimate: invalid");
        match err {
            ApiError::BadRequest(msg) => assert_eq!(msg, "originalEstimate: invalid"),
            _ => panic!("Expected BadRequest error"),
        }
    }

    #[test]
    fn test_error_from_status_401() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, "test");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_error_from_status_404() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "issue DEV-1");
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "issue DEV-1"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_error_from_status_429_and_5xx_are_transient() {
        assert!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, "x").is_transient());
        assert!(ApiError::from_status(StatusCode::BAD_GATEWAY, "x").is_transient());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, "x").is_transient());
        assert!(!ApiError::from_status(StatusCode::CONFLICT, "x").is_transient());
    }

    #[test]
    fn test_unexpected_status_is_server_error() {
        let err = ApiError::from_status(StatusCode::IM_A_TEAPOT, "tea");
        assert!(err.to_string().contains("Unexpected HTTP 418"));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ApiError::Unauthorized.to_string(),
            "Authentication failed: check your email and API token"
        );
        assert_eq!(
            ApiError::NotFound("DEV-1".to_string()).to_string(),
            "Resource not found: DEV-1"
        );
    }
}
