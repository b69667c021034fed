//! Request-level error model and its HTTP mapping.
//! Every failure here is terminal for the request that produced it; none of them
//! take the process down.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Unknown user, disabled account or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Request body could not be read as the expected shape. The payload is kept for logs only.
    #[error("Bad request")]
    MalformedRequest(String),
    /// No static file and no fallback index document.
    #[error("Not Found")]
    ResourceNotFound,
    #[error("Internal error")]
    Internal(String),
}

impl AppError {
    pub fn code_str(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::MalformedRequest(_) => "malformed_request",
            AppError::ResourceNotFound => "not_found",
            AppError::Internal(_) => "internal",
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::ResourceNotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn malformed<S: Into<String>>(detail: S) -> Self { AppError::MalformedRequest(detail.into()) }
    pub fn internal<S: Into<String>>(detail: S) -> Self { AppError::Internal(detail.into()) }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        match self {
            AppError::ResourceNotFound => {
                (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], "Not Found").into_response()
            }
            AppError::Internal(ref detail) => {
                tracing::error!(code = self.code_str(), "{detail}");
                (status, Json(json!({"ok": false, "error": self.to_string()}))).into_response()
            }
            _ => (status, Json(json!({"ok": false, "error": self.to_string()}))).into_response(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
