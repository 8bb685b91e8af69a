//! Client error types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable reason attached to a 401 by the auth middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorCode {
    MissingToken,
    TokenExpired,
    MalformedToken,
    InvalidToken,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthErrorCode::MissingToken => "MISSING_TOKEN",
            AuthErrorCode::TokenExpired => "TOKEN_EXPIRED",
            AuthErrorCode::MalformedToken => "MALFORMED_TOKEN",
            AuthErrorCode::InvalidToken => "INVALID_TOKEN",
            AuthErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Error type for Formsmith client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx answer from the server
    #[error("API error {status}: {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The session is no longer valid; every code leads back to login
    #[error("Session invalid ({code}): {message}")]
    Unauthorized {
        code: AuthErrorCode,
        message: String,
        redirect_to: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Malformed response: {0}")]
    Schema(String),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The session never loaded a document, so there is nothing to save
    #[error("No form loaded")]
    NoDocument,
}

impl ClientError {
    /// Returns true for any 401, whatever its code
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Api { status: 409, .. })
    }

    /// Transport failures and 5xx answers may succeed on a second attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Where the UI should navigate after this error, if anywhere
    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { redirect_to, .. } => Some(redirect_to.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_codes_parse() {
        let code: AuthErrorCode = serde_json::from_str("\"TOKEN_EXPIRED\"").unwrap();
        assert_eq!(code, AuthErrorCode::TokenExpired);
        let code: AuthErrorCode = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(code, AuthErrorCode::Unknown);
    }

    #[test]
    fn test_error_classification() {
        let err = ClientError::Api { status: 503, code: "unavailable".into(), message: String::new() };
        assert!(err.is_retryable());
        assert!(!err.is_auth_error());

        let err = ClientError::Unauthorized {
            code: AuthErrorCode::MissingToken,
            message: "No token".into(),
            redirect_to: "/login".into(),
        };
        assert!(err.is_auth_error());
        assert_eq!(err.redirect_to(), Some("/login"));
        assert!(!err.is_retryable());
    }
}
