//! API errors and their wire representation

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::middleware::auth::AuthCode;
use crate::models::ApiResponse;
use crate::storage::RepositoryError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Unauthorized {
        code: AuthCode,
        message: String,
        redirect_to: String,
    },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body sent with every 401
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthFailure<'a> {
    message: &'a str,
    code: AuthCode,
    redirect_to: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::StorageError(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::BAD_REQUEST => "BAD_REQUEST",
            StatusCode::CONFLICT => "CONFLICT",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Unauthorized { code, message, redirect_to } = &self {
            let body = AuthFailure { message, code: *code, redirect_to };
            return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body: ApiResponse<()> = ApiResponse::error(self.code(), &self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_map_to_status() {
        let not_found = ApiError::from(RepositoryError::NotFound("form".into()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        let conflict = ApiError::from(RepositoryError::Conflict("dup".into()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_credentials_is_bad_request() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::BAD_REQUEST);
    }
}
