//! Client error types

use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered outside the success range
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Refresh token missing or rejected; stored tokens have been cleared
    #[error("Session expired. Please login again.")]
    SessionExpired,

    /// Login or registration rejected by the server
    #[error("{0}")]
    Authentication(String),

    /// Success response whose body is not the expected JSON
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Session tokens could not be written or removed
    #[error("Token storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    /// Build an API error from a status code and an optional server message
    pub fn api(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let status = status.as_u16();
        Self::Api {
            status,
            message: message.unwrap_or_else(|| format!("API Error: {status}")),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the caller should send the user back to login
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn api_error_prefers_server_message() {
        let err = ClientError::api(StatusCode::BAD_REQUEST, Some("X".into()));
        assert_eq!(err.to_string(), "X");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn api_error_falls_back_to_status() {
        let err = ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(err.to_string(), "API Error: 500");
    }

    #[test]
    fn session_expired_is_flagged() {
        assert!(ClientError::SessionExpired.is_session_expired());
        assert!(!ClientError::Authentication("nope".into()).is_session_expired());
        assert_eq!(ClientError::SessionExpired.status(), None);
    }
}
