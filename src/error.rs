// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::middleware::response::Status;

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Messages are always generic: the underlying cause is logged where the error is
/// produced and never sent to the client.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    EmptyRequest,
    InvalidJson,
    ValidationError {
        message: String,
        field_errors: BTreeMap<String, String>,
    },
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 422 Unprocessable Entity (domain operation failed)
    UnprocessableEntity(String),

    // 500 Internal Server Error
    MissingClaim(String),
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::EmptyRequest => StatusCode::BAD_REQUEST,
            ApiError::InvalidJson => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MissingClaim(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::EmptyRequest => "empty request",
            ApiError::InvalidJson => "failed to decode request",
            ApiError::ValidationError { message, .. } => message,
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::MissingClaim(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to the `{status, error}` envelope
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "status": Status::Error,
            "error": self.message(),
        });

        if let ApiError::ValidationError { field_errors, .. } = self {
            body["field_errors"] = json!(field_errors);
        }

        body
    }
}

impl ApiError {
    pub fn validation_error(field_errors: BTreeMap<String, String>) -> Self {
        let message = field_errors
            .iter()
            .map(|(field, problem)| format!("field {} is invalid: {}", field, problem))
            .collect::<Vec<_>>()
            .join(", ");

        ApiError::ValidationError {
            message,
            field_errors,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn missing_claim(message: impl Into<String>) -> Self {
        ApiError::MissingClaim(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
